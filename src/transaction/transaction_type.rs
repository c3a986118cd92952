//! The closed set of mobile money transaction categories.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The category of a mobile money transaction.
///
/// The category decides how a transaction is labelled and whether it counts
/// as money coming in or going out, see [TransactionType::direction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money received from another mobile money user.
    IncomingMoney,
    /// A payment to a merchant code.
    PaymentToCode,
    /// A transfer to another mobile number.
    TransferMobile,
    /// Cash or a bank deposit added to the account.
    BankDeposit,
    /// Airtime bought for a phone number.
    AirtimePayment,
    /// Electricity bought with a Cash Power token.
    CashpowerPayment,
    /// A payment initiated by a third party such as a bill collector.
    ThirdPartyTransaction,
    /// Cash withdrawn at an agent.
    AgentWithdrawal,
    /// A transfer out to a bank account.
    BankTransfer,
    /// An internet or voice bundle purchase.
    BundlePurchase,
}

/// Whether a transaction adds money to the account or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Money coming into the account.
    In,
    /// Money leaving the account.
    Out,
}

impl TransactionType {
    /// Every transaction type, in declaration order.
    pub const ALL: [TransactionType; 10] = [
        TransactionType::IncomingMoney,
        TransactionType::PaymentToCode,
        TransactionType::TransferMobile,
        TransactionType::BankDeposit,
        TransactionType::AirtimePayment,
        TransactionType::CashpowerPayment,
        TransactionType::ThirdPartyTransaction,
        TransactionType::AgentWithdrawal,
        TransactionType::BankTransfer,
        TransactionType::BundlePurchase,
    ];

    /// The snake_case name used in URLs, JSON, CSV and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::IncomingMoney => "incoming_money",
            TransactionType::PaymentToCode => "payment_to_code",
            TransactionType::TransferMobile => "transfer_mobile",
            TransactionType::BankDeposit => "bank_deposit",
            TransactionType::AirtimePayment => "airtime_payment",
            TransactionType::CashpowerPayment => "cashpower_payment",
            TransactionType::ThirdPartyTransaction => "third_party_transaction",
            TransactionType::AgentWithdrawal => "agent_withdrawal",
            TransactionType::BankTransfer => "bank_transfer",
            TransactionType::BundlePurchase => "bundle_purchase",
        }
    }

    /// The human readable label shown in tables, charts and badges.
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::IncomingMoney => "Incoming Money",
            TransactionType::PaymentToCode => "Payment To Code",
            TransactionType::TransferMobile => "Transfer Mobile",
            TransactionType::BankDeposit => "Bank Deposit",
            TransactionType::AirtimePayment => "Airtime Payment",
            TransactionType::CashpowerPayment => "Cashpower Payment",
            TransactionType::ThirdPartyTransaction => "Third Party Transaction",
            TransactionType::AgentWithdrawal => "Agent Withdrawal",
            TransactionType::BankTransfer => "Bank Transfer",
            TransactionType::BundlePurchase => "Bundle Purchase",
        }
    }

    /// Deposits and received money count as money in, everything else as money out.
    pub fn direction(self) -> Direction {
        match self {
            TransactionType::IncomingMoney | TransactionType::BankDeposit => Direction::In,
            TransactionType::PaymentToCode
            | TransactionType::TransferMobile
            | TransactionType::AirtimePayment
            | TransactionType::CashpowerPayment
            | TransactionType::ThirdPartyTransaction
            | TransactionType::AgentWithdrawal
            | TransactionType::BankTransfer
            | TransactionType::BundlePurchase => Direction::Out,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|transaction_type| transaction_type.as_str() == s)
            .ok_or_else(|| Error::UnknownTransactionType(s.to_owned()))
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}
