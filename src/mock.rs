//! Generates realistic looking MoMo transactions for demos and test fixtures.
//!
//! The generator is seeded so the same seed always produces the same
//! transactions, relative to the `now` it is given.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use time::{Duration, OffsetDateTime};

use crate::{
    import::create_import_id,
    transaction::{Transaction, TransactionBuilder, TransactionType},
};

/// The smallest generated amount in Rwandan francs.
pub const MIN_AMOUNT: i64 = 1_000;
/// The largest generated amount in Rwandan francs.
pub const MAX_AMOUNT: i64 = 500_999;
/// How far back from `now` generated transactions may be.
pub const HISTORY_DAYS: i64 = 180;

const THIRD_PARTY_SERVICES: [&str; 3] = ["Tigo", "Airtel", "PayPal"];

/// Generate `count` transactions spread over the [HISTORY_DAYS] before `now`.
///
/// Each transaction gets an import ID so loading the same fixture twice does
/// not create duplicates.
pub fn generate_transactions(count: usize, seed: u64, now: OffsetDateTime) -> Vec<TransactionBuilder> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|_| generate_transaction(&mut rng, now))
        .collect()
}

fn generate_transaction(rng: &mut StdRng, now: OffsetDateTime) -> TransactionBuilder {
    let transaction_type = *TransactionType::ALL
        .choose(rng)
        .unwrap_or(&TransactionType::IncomingMoney);
    let amount = rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT);
    let phone = format!("+25078{:07}", rng.gen_range(0..10_000_000));
    let reference = format!("MTN{:05}", rng.gen_range(0..100_000));
    let seconds_ago = rng.gen_range(0..HISTORY_DAYS * 24 * 60 * 60);
    let timestamp = (now - Duration::seconds(seconds_ago)).replace_nanosecond(0).unwrap_or(now);

    let message = mock_message(rng, transaction_type, amount, &phone, &reference);

    let builder = Transaction::build(timestamp, transaction_type, amount)
        .phone(&phone)
        .reference(&reference)
        .import_id(Some(create_import_id(timestamp, &message)));

    let builder = match transaction_type {
        TransactionType::TransferMobile => builder.fee(Some(amount / 100)),
        TransactionType::AgentWithdrawal => builder.fee(Some(amount / 50)),
        _ => builder,
    };

    builder.message(&message)
}

fn mock_message(
    rng: &mut StdRng,
    transaction_type: TransactionType,
    amount: i64,
    phone: &str,
    reference: &str,
) -> String {
    match transaction_type {
        TransactionType::IncomingMoney => format!(
            "You have received RWF {amount} from {phone}. Your new balance is RWF {}. Reference: {reference}",
            rng.gen_range(10_000..1_000_000)
        ),
        TransactionType::PaymentToCode => format!(
            "You have paid RWF {amount} to merchant code. Transaction ID: {reference}. Your new balance is RWF {}.",
            rng.gen_range(10_000..1_000_000)
        ),
        TransactionType::TransferMobile => format!(
            "You have transferred RWF {amount} to {phone}. Fee: RWF {}. Reference: {reference}",
            amount / 100
        ),
        TransactionType::BankDeposit => format!(
            "Bank deposit of RWF {amount} successful. Bank: BK. Reference: {reference}"
        ),
        TransactionType::AirtimePayment => format!(
            "Airtime purchase successful. Amount: RWF {amount}. Phone: {phone}. Reference: {reference}"
        ),
        TransactionType::CashpowerPayment => format!(
            "CashPower payment of RWF {amount} successful. Meter: {}. Reference: {reference}",
            rng.gen_range(10_000_000..100_000_000)
        ),
        TransactionType::ThirdPartyTransaction => format!(
            "Third party transaction of RWF {amount}. Service: {}. Reference: {reference}",
            THIRD_PARTY_SERVICES
                .choose(rng)
                .unwrap_or(&THIRD_PARTY_SERVICES[0])
        ),
        TransactionType::AgentWithdrawal => format!(
            "Cash withdrawal of RWF {amount} from agent {phone}. Fee: RWF {}. Reference: {reference}",
            amount / 50
        ),
        TransactionType::BankTransfer => format!(
            "Bank transfer of RWF {amount} to account ****{}. Reference: {reference}",
            rng.gen_range(1_000..10_000)
        ),
        TransactionType::BundlePurchase => format!(
            "Internet bundle purchase. Amount: RWF {amount}. Data: {}MB. Reference: {reference}",
            amount / 100
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::{Duration, macros::datetime};

    use super::{HISTORY_DAYS, MAX_AMOUNT, MIN_AMOUNT, generate_transactions};

    #[test]
    fn same_seed_same_transactions() {
        let now = datetime!(2025-06-01 12:00 UTC);

        assert_eq!(
            generate_transactions(50, 7, now),
            generate_transactions(50, 7, now)
        );
        assert_ne!(
            generate_transactions(50, 7, now),
            generate_transactions(50, 8, now)
        );
    }

    #[test]
    fn values_are_in_range() {
        let now = datetime!(2025-06-01 12:00 UTC);

        for transaction in generate_transactions(500, 42, now) {
            assert!((MIN_AMOUNT..=MAX_AMOUNT).contains(&transaction.amount));
            assert!(transaction.timestamp <= now);
            assert!(transaction.timestamp > now - Duration::days(HISTORY_DAYS));
            assert!(transaction.phone.starts_with("+25078"));
            assert_eq!(transaction.phone.len(), 13);
            assert!(transaction.reference.starts_with("MTN"));
            assert_eq!(transaction.reference.len(), 8);
            assert!(transaction.message.contains(&transaction.reference));
        }
    }

    #[test]
    fn import_ids_are_unique() {
        let transactions = generate_transactions(200, 1, datetime!(2025-06-01 12:00 UTC));

        let import_ids: HashSet<_> = transactions
            .iter()
            .map(|transaction| transaction.import_id.expect("want an import ID"))
            .collect();

        assert_eq!(import_ids.len(), transactions.len());
    }

    #[test]
    fn fees_match_messages() {
        for transaction in generate_transactions(200, 3, datetime!(2025-06-01 12:00 UTC)) {
            if let Some(fee) = transaction.fee {
                assert!(transaction.message.contains(&format!("Fee: RWF {fee}.")));
            }
        }
    }
}
