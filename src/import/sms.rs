//! Parses SMS backup XML files containing MTN MoMo notifications.
//!
//! A backup looks like `<smses><sms date="<unix millis>" body="..."/>...</smses>`.
//! Each body is matched against the known notification formats. One-time
//! passwords are dropped silently and anything else that is not recognised,
//! such as reversals, is logged and skipped.

use std::sync::OnceLock;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use regex::{Captures, Regex};
use time::OffsetDateTime;

use crate::{
    Error,
    import::{ParsedImport, create_import_id, parse_amount},
    transaction::{Transaction, TransactionBuilder, TransactionType},
};

/// The notification formats that produce a transaction, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SmsKind {
    IncomingMoney,
    PaymentCompleted,
    TransferSent,
    BankDeposit,
    CashpowerPayment,
    AirtimePayment,
    BundlePurchase,
    AgentWithdrawal,
    ThirdPartyPayment,
}

fn sms_patterns() -> &'static [(SmsKind, Regex)] {
    static PATTERNS: OnceLock<Vec<(SmsKind, Regex)>> = OnceLock::new();

    PATTERNS.get_or_init(|| {
        [
            (
                SmsKind::IncomingMoney,
                r"You have received ([\d,.]+) RWF from (.*?) \((\*+\d+|.*?)\) on your mobile money account at .*?\. .*?Your new balance:\s*([\d,.]+) RWF",
            ),
            (
                SmsKind::PaymentCompleted,
                r"TxId: (\d+)\. Your payment of ([\d,.]+) RWF to (.*?) \d+ has been completed at .*?\. Your new balance: ([\d,.]+) RWF",
            ),
            (
                SmsKind::TransferSent,
                r"\*165\*S\*([\d,.]+) RWF transferred to (.*?)(\s*\(.*?\))? from .*?\. Fee was: ([\d,.]+) RWF\. New balance: ([\d,.]+) RWF",
            ),
            (
                SmsKind::BankDeposit,
                r"A bank deposit of ([\d,.]+) RWF has been added to your mobile money account at .*?\. Your NEW BALANCE\s*:\s*([\d,.]+) RWF",
            ),
            (
                SmsKind::CashpowerPayment,
                r"Your payment of ([\d,.]+) RWF to MTN Cash Power.*?Fee was ([\d,.]+) RWF\. Your new balance: ([\d,.]+) RWF",
            ),
            (
                SmsKind::AirtimePayment,
                r"Your payment of ([\d,.]+) RWF to Airtime with token.*?Fee was ([\d,.]+) RWF\. Your new balance: ([\d,.]+) RWF",
            ),
            (
                SmsKind::BundlePurchase,
                r"Your payment of ([\d,.]+) RWF to Bundles and Packs.*?Fee was ([\d,.]+) RWF\. Your new balance: ([\d,.]+) RWF",
            ),
            (
                SmsKind::AgentWithdrawal,
                r"You .*? have via agent: (.*?) \((.*?)\), withdrawn ([\d,.]+) RWF.*?Your new balance: ([\d,.]+) RWF\. Fee paid: ([\d,.]+) RWF",
            ),
            (
                SmsKind::ThirdPartyPayment,
                r"Y'ello,A transaction of ([\d,.]+) RWF by (.*?) on your MOMO account was successfully completed at .*?\. .*?Your new balance:\s*([\d,.]+) RWF\. Fee was ([\d,.]+) RWF",
            ),
        ]
        .into_iter()
        .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("SMS patterns are valid")))
        .collect()
    })
}

fn otp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| Regex::new(r"one-time password is :\s*\d+").expect("OTP pattern is valid"))
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        Regex::new(r"(?:TxId|Financial Transaction Id):\s*(\d+)")
            .expect("reference pattern is valid")
    })
}

/// What a single SMS body turned out to be.
#[derive(Debug, PartialEq)]
enum SmsOutcome {
    Transaction(TransactionBuilder),
    OneTimePassword,
    Unrecognised,
}

/// Parses an SMS backup into transactions.
///
/// # Errors
/// Returns [Error::InvalidXml] if `xml` is not well formed or has no
/// `<smses>` root element. Individual messages that cannot be parsed are
/// skipped and counted in [ParsedImport::skipped].
pub fn parse_sms_backup(xml: &str) -> Result<ParsedImport, Error> {
    let mut reader = Reader::from_str(xml);
    let mut has_root = false;
    let mut parsed = ParsedImport::default();
    let mut message_count = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"smses" => has_root = true,
                b"sms" if has_root => {
                    message_count += 1;

                    match parse_sms_element(&element)? {
                        Some(SmsOutcome::Transaction(builder)) => parsed.transactions.push(builder),
                        Some(SmsOutcome::OneTimePassword) => {}
                        Some(SmsOutcome::Unrecognised) | None => parsed.skipped += 1,
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(Error::InvalidXml(format!(
                    "error at position {}: {error}",
                    reader.error_position()
                )));
            }
        }
    }

    if !has_root {
        return Err(Error::InvalidXml("missing <smses> root element".to_owned()));
    }

    tracing::info!(
        "Parsed {} transactions from {message_count} messages, skipped {}",
        parsed.transactions.len(),
        parsed.skipped
    );

    Ok(parsed)
}

/// Reads the date and body of an `<sms>` element and parses the body.
///
/// Returns `None` if the element is missing either attribute or has an
/// invalid date.
fn parse_sms_element(element: &BytesStart) -> Result<Option<SmsOutcome>, Error> {
    let mut date = None;
    let mut body = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|error| Error::InvalidXml(error.to_string()))?;

        let slot = match attribute.key.as_ref() {
            b"date" => &mut date,
            b"body" => &mut body,
            _ => continue,
        };

        let value = attribute
            .unescape_value()
            .map_err(|error| Error::InvalidXml(error.to_string()))?;
        *slot = Some(value.into_owned());
    }

    let (Some(date), Some(body)) = (date, body) else {
        tracing::warn!("Skipping <sms> element without a date and body");
        return Ok(None);
    };

    let Some(timestamp) = parse_unix_millis(&date) else {
        tracing::warn!("Skipping SMS with invalid date {date:?}: {body}");
        return Ok(None);
    };

    Ok(Some(parse_sms_body(timestamp, &body)))
}

fn parse_unix_millis(text: &str) -> Option<OffsetDateTime> {
    let millis: i128 = text.trim().parse().ok()?;

    OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
}

fn parse_sms_body(timestamp: OffsetDateTime, body: &str) -> SmsOutcome {
    if otp_pattern().is_match(body) {
        return SmsOutcome::OneTimePassword;
    }

    let matched = sms_patterns()
        .iter()
        .find_map(|(kind, pattern)| pattern.captures(body).map(|captures| (*kind, captures)));

    let Some((kind, captures)) = matched else {
        tracing::warn!("Unprocessed SMS at {timestamp}: {body}");
        return SmsOutcome::Unrecognised;
    };

    match build_transaction(kind, &captures, timestamp) {
        Ok(builder) => {
            let reference = reference_pattern()
                .captures(body)
                .and_then(|captures| captures.get(1))
                .map_or("", |m| m.as_str());

            SmsOutcome::Transaction(
                builder
                    .reference(reference)
                    .message(body)
                    .import_id(Some(create_import_id(timestamp, body))),
            )
        }
        Err(error) => {
            tracing::warn!("Could not parse {kind:?} SMS at {timestamp}: {error}");
            SmsOutcome::Unrecognised
        }
    }
}

fn text<'a>(captures: &'a Captures, index: usize) -> &'a str {
    captures.get(index).map_or("", |m| m.as_str().trim())
}

fn amount(captures: &Captures, index: usize) -> Result<i64, Error> {
    parse_amount(text(captures, index))
}

fn build_transaction(
    kind: SmsKind,
    captures: &Captures,
    timestamp: OffsetDateTime,
) -> Result<TransactionBuilder, Error> {
    let builder = match kind {
        SmsKind::IncomingMoney => {
            Transaction::build(timestamp, TransactionType::IncomingMoney, amount(captures, 1)?)
                .sender_name(Some(text(captures, 2).to_owned()))
                .phone(text(captures, 3))
                .new_balance(Some(amount(captures, 4)?))
        }
        SmsKind::PaymentCompleted => {
            Transaction::build(timestamp, TransactionType::PaymentToCode, amount(captures, 2)?)
                .recipient_name(Some(text(captures, 3).to_owned()))
                .new_balance(Some(amount(captures, 4)?))
        }
        SmsKind::TransferSent => {
            let phone = text(captures, 3).trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());

            Transaction::build(timestamp, TransactionType::TransferMobile, amount(captures, 1)?)
                .recipient_name(Some(text(captures, 2).to_owned()))
                .phone(phone)
                .fee(Some(amount(captures, 4)?))
                .new_balance(Some(amount(captures, 5)?))
        }
        SmsKind::BankDeposit => {
            Transaction::build(timestamp, TransactionType::BankDeposit, amount(captures, 1)?)
                .sender_name(Some("Bank".to_owned()))
                .new_balance(Some(amount(captures, 2)?))
        }
        SmsKind::CashpowerPayment | SmsKind::AirtimePayment | SmsKind::BundlePurchase => {
            let transaction_type = match kind {
                SmsKind::CashpowerPayment => TransactionType::CashpowerPayment,
                SmsKind::AirtimePayment => TransactionType::AirtimePayment,
                _ => TransactionType::BundlePurchase,
            };

            Transaction::build(timestamp, transaction_type, amount(captures, 1)?)
                .fee(Some(amount(captures, 2)?))
                .new_balance(Some(amount(captures, 3)?))
        }
        SmsKind::AgentWithdrawal => {
            Transaction::build(timestamp, TransactionType::AgentWithdrawal, amount(captures, 3)?)
                .recipient_name(Some(format!("Agent: {}", text(captures, 1))))
                .phone(text(captures, 2))
                .new_balance(Some(amount(captures, 4)?))
                .fee(Some(amount(captures, 5)?))
        }
        SmsKind::ThirdPartyPayment => Transaction::build(
            timestamp,
            TransactionType::ThirdPartyTransaction,
            amount(captures, 1)?,
        )
        .recipient_name(Some(text(captures, 2).to_owned()))
        .new_balance(Some(amount(captures, 3)?))
        .fee(Some(amount(captures, 4)?)),
    };

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        Error,
        import::create_import_id,
        transaction::{Transaction, TransactionType},
    };

    use super::{SmsOutcome, parse_sms_backup, parse_sms_body};

    const INCOMING: &str = "You have received 2000 RWF from Jane Smith (*********013) on your mobile money account at 2024-05-10 16:30:51. Message from sender: . Your new balance:2000 RWF. Financial Transaction Id: 76662021700.";
    const PAYMENT: &str = "TxId: 73214484437. Your payment of 1,000 RWF to Jane Smith 12845 has been completed at 2024-05-10 16:31:39. Your new balance: 1,000 RWF. Fee was 0 RWF.";
    const TRANSFER: &str = "*165*S*10000 RWF transferred to Samuel Carter (250791666666) from 36521838 at 2024-05-11 20:34:47 . Fee was: 100 RWF. New balance: 28300 RWF. Kugura ama inite cg interineti kuri MoMo, Kanda *182*2*1# .*EN#";
    const BANK_DEPOSIT: &str = "*113*R*A bank deposit of 40000 RWF has been added to your mobile money account at 2024-05-11 18:43:49. Your NEW BALANCE :40400 RWF. Cash Deposit::CASH::::0::250795963036.Thank you for using MTN MobileMoney.*EN#";
    const CASHPOWER: &str = "*162*TxId:13913173274*S*Your payment of 3,000 RWF to MTN Cash Power with token 36337-03286-52174-46567 has been completed at 2024-05-13 20:14:26. Fee was 0 RWF. Your new balance: 7,300 RWF . Message: - -. *EN#";
    const AIRTIME: &str = "*162*TxId:13913173275*S*Your payment of 2000 RWF to Airtime with token  has been completed at 2024-05-12 11:41:28. Fee was 0 RWF. Your new balance: 25280 RWF . Message: - -. *EN#";
    const BUNDLE: &str = "*162*TxId:13913173276*S*Your payment of 500 RWF to Bundles and Packs with token  has been completed at 2024-05-12 11:41:28. Fee was 0 RWF. Your new balance: 24780 RWF . Message: - -. *EN#";
    const WITHDRAWAL: &str = "You Jane Smith (*********036) have via agent: Agent Sophia (250790777777), withdrawn 20000 RWF from your mobile money account: 36521838 at 2024-05-26 02:10:27 and you can now collect your money in cash. Your new balance: 6400 RWF. Fee paid: 350 RWF. Message from agent: 1. Financial Transaction Id: 14098463509.";
    const THIRD_PARTY: &str = "*164*S*Y'ello,A transaction of 25000 RWF by DIRECT PAYMENT LTD on your MOMO account was successfully completed at 2024-05-26 14:16:00. Message from debit receiver: . Your new balance:2000 RWF. Fee was 0 RWF. Financial Transaction Id: 14150744541.*EN#";
    const REVERSAL: &str = "Your transaction to Jane Smith (250791666666) with 3500 RWF has been reversed at 2024-06-23 19:44:34. Your new balance is 3000 RWF.";
    const OTP: &str = "Your one-time password is :123456. Do not share it.";

    fn must_parse(body: &str) -> Transaction {
        let timestamp = datetime!(2024-05-10 14:30:51 UTC);

        match parse_sms_body(timestamp, body) {
            SmsOutcome::Transaction(builder) => {
                assert_eq!(builder.import_id, Some(create_import_id(timestamp, body)));
                assert_eq!(builder.message, body);
                builder.finalise(1)
            }
            outcome => panic!("want a transaction for {body:?}, got {outcome:?}"),
        }
    }

    #[test]
    fn parses_incoming_money() {
        let got = must_parse(INCOMING);

        assert_eq!(got.transaction_type, TransactionType::IncomingMoney);
        assert_eq!(got.amount, 2000);
        assert_eq!(got.sender_name.as_deref(), Some("Jane Smith"));
        assert_eq!(got.phone, "*********013");
        assert_eq!(got.new_balance, Some(2000));
        assert_eq!(got.reference, "76662021700");
    }

    #[test]
    fn parses_payment_to_code() {
        let got = must_parse(PAYMENT);

        assert_eq!(got.transaction_type, TransactionType::PaymentToCode);
        assert_eq!(got.amount, 1000);
        assert_eq!(got.recipient_name.as_deref(), Some("Jane Smith"));
        assert_eq!(got.new_balance, Some(1000));
        assert_eq!(got.reference, "73214484437");
    }

    #[test]
    fn parses_mobile_transfer() {
        let got = must_parse(TRANSFER);

        assert_eq!(got.transaction_type, TransactionType::TransferMobile);
        assert_eq!(got.amount, 10000);
        assert_eq!(got.recipient_name.as_deref(), Some("Samuel Carter"));
        assert_eq!(got.phone, "250791666666");
        assert_eq!(got.fee, Some(100));
        assert_eq!(got.new_balance, Some(28300));
    }

    #[test]
    fn parses_bank_deposit() {
        let got = must_parse(BANK_DEPOSIT);

        assert_eq!(got.transaction_type, TransactionType::BankDeposit);
        assert_eq!(got.amount, 40000);
        assert_eq!(got.sender_name.as_deref(), Some("Bank"));
        assert_eq!(got.new_balance, Some(40400));
    }

    #[test]
    fn parses_token_payments() {
        let cases = [
            (CASHPOWER, TransactionType::CashpowerPayment, 3000, 7300),
            (AIRTIME, TransactionType::AirtimePayment, 2000, 25280),
            (BUNDLE, TransactionType::BundlePurchase, 500, 24780),
        ];

        for (body, want_type, want_amount, want_balance) in cases {
            let got = must_parse(body);

            assert_eq!(got.transaction_type, want_type);
            assert_eq!(got.amount, want_amount);
            assert_eq!(got.fee, Some(0));
            assert_eq!(got.new_balance, Some(want_balance));
        }
    }

    #[test]
    fn parses_agent_withdrawal() {
        let got = must_parse(WITHDRAWAL);

        assert_eq!(got.transaction_type, TransactionType::AgentWithdrawal);
        assert_eq!(got.amount, 20000);
        assert_eq!(got.recipient_name.as_deref(), Some("Agent: Agent Sophia"));
        assert_eq!(got.phone, "250790777777");
        assert_eq!(got.fee, Some(350));
        assert_eq!(got.new_balance, Some(6400));
        assert_eq!(got.reference, "14098463509");
    }

    #[test]
    fn parses_third_party_payment() {
        let got = must_parse(THIRD_PARTY);

        assert_eq!(got.transaction_type, TransactionType::ThirdPartyTransaction);
        assert_eq!(got.amount, 25000);
        assert_eq!(got.recipient_name.as_deref(), Some("DIRECT PAYMENT LTD"));
        assert_eq!(got.new_balance, Some(2000));
        assert_eq!(got.fee, Some(0));
    }

    #[test]
    fn skips_otp_and_unrecognised_messages() {
        let timestamp = datetime!(2024-05-10 14:30:51 UTC);

        assert_eq!(parse_sms_body(timestamp, OTP), SmsOutcome::OneTimePassword);
        assert_eq!(parse_sms_body(timestamp, REVERSAL), SmsOutcome::Unrecognised);
        assert_eq!(
            parse_sms_body(timestamp, "Hello from the network"),
            SmsOutcome::Unrecognised
        );
    }

    #[test]
    fn skips_amounts_above_limit() {
        let xml = format!(
            r#"<smses count="2">
  <sms date="1715351451000" body="{}" />
  <sms date="1715351499000" body="{}" />
</smses>"#,
            INCOMING.replace("received 2000 RWF", "received 99999999999999999999 RWF"),
            PAYMENT,
        );

        let got = parse_sms_backup(&xml).unwrap();

        assert_eq!(got.transactions.len(), 1);
        assert_eq!(got.skipped, 1);
        assert_eq!(got.transactions[0].amount, 1000);
    }

    #[test]
    fn parses_backup_file() {
        let xml = format!(
            r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="4">
  <sms protocol="0" address="M-Money" date="1715351451000" type="1" body="{}" readable_date="10 May 2024 4:30:51 PM" />
  <sms protocol="0" address="M-Money" date="1715351499000" type="1" body="{}" />
  <sms protocol="0" address="M-Money" date="1715351500000" type="1" body="{}" />
  <sms protocol="0" address="M-Money" date="1715351501000" type="1" body="{}" />
</smses>"#,
            INCOMING,
            PAYMENT,
            OTP,
            REVERSAL.replace('"', "&quot;"),
        );

        let got = parse_sms_backup(&xml).unwrap();

        assert_eq!(got.transactions.len(), 2);
        assert_eq!(got.skipped, 1);
        assert_eq!(
            got.transactions[0].timestamp,
            datetime!(2024-05-10 14:30:51 UTC)
        );
        assert_eq!(got.transactions[0].transaction_type, TransactionType::IncomingMoney);
        assert_eq!(got.transactions[1].transaction_type, TransactionType::PaymentToCode);
    }

    #[test]
    fn unescapes_message_bodies() {
        let xml = r#"<smses><sms date="1715351451000" body="*164*S*Y&apos;ello,A transaction of 25000 RWF by DIRECT PAYMENT LTD on your MOMO account was successfully completed at 2024-05-26 14:16:00. Message from debit receiver: . Your new balance:2000 RWF. Fee was 0 RWF. Financial Transaction Id: 14150744541.*EN#"/></smses>"#;

        let got = parse_sms_backup(xml).unwrap();

        assert_eq!(got.transactions.len(), 1);
        assert!(got.transactions[0].message.contains("Y'ello"));
    }

    #[test]
    fn skips_messages_with_bad_dates() {
        let xml = format!(r#"<smses><sms date="yesterday" body="{INCOMING}"/></smses>"#);

        let got = parse_sms_backup(&xml).unwrap();

        assert!(got.transactions.is_empty());
        assert_eq!(got.skipped, 1);
    }

    #[test]
    fn rejects_malformed_xml() {
        let result = parse_sms_backup("<smses><sms date=\"1\" body=\"x\"></smses>");

        assert!(
            matches!(result, Err(Error::InvalidXml(_))),
            "want InvalidXml, got {result:?}"
        );
    }

    #[test]
    fn rejects_document_without_root() {
        let result = parse_sms_backup("Timestamp,Type,Amount\n");

        assert_eq!(
            result,
            Err(Error::InvalidXml("missing <smses> root element".to_owned()))
        );
    }
}
