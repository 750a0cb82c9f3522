use std::{cell::RefCell, rc::Rc, str::from_utf8, sync::Arc};

use chrono::{TimeZone, Utc};
use neo_ledger::{
    bin_utils::{Report, RowError, Service},
    clock::ManualClock,
    config::LedgerConfig,
    processor::{
        TransactionProcessError,
        session::{Session, Stores},
    },
    store::{
        file::{CsvTransactionLog, JsonLedgerStore, JsonPremiumStore},
        in_memory::{InMemoryLedgerStore, InMemoryPremiumStore, InMemoryTransactionLog},
    },
};
use rust_decimal_macros::dec;

const TEST_FILE: &str = include_str!("operations.csv");

type Rejections = Rc<RefCell<Vec<(u64, String)>>>;

fn collecting_printer(rejections: &Rejections) -> Box<dyn FnMut(u64, RowError)> {
    let rejections = rejections.clone();
    Box::new(move |line, err| rejections.borrow_mut().push((line, err.to_string())))
}

fn in_memory_session(
    clock: Arc<ManualClock>,
) -> Session<InMemoryLedgerStore, InMemoryTransactionLog, InMemoryPremiumStore> {
    Session::open(
        "alice",
        Stores {
            ledger: InMemoryLedgerStore::default(),
            log: InMemoryTransactionLog::default(),
            premium: InMemoryPremiumStore::default(),
        },
        clock,
        LedgerConfig::default(),
    )
    .unwrap()
}

#[test]
fn process_operations() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let mut session = in_memory_session(clock);
    let rejections = Rejections::default();
    let mut output = Vec::new();
    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        report: Report::Balances,
        error_printer: collecting_printer(&rejections),
    };
    service.run(&mut session).unwrap();

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        [
            "account,type,balance",
            "alice,BankAccount,50",
            "bob,SavingsAcct,144.50",
            "interest,InterestRewardAcct,126.00",
        ]
    );

    let rejections = rejections.borrow();
    let messages: Vec<&str> = rejections.iter().map(|(_, msg)| msg.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Withdrawal interrupted: Not enough funds in 'alice'. Balance: $50.00",
            "Account 'nobody' does not exist",
            "Account with name 'alice' already exists",
            "Amount must not be negative for Deposit",
        ]
    );
}

#[test]
fn history_report() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let mut session = in_memory_session(clock);
    let rejections = Rejections::default();
    let mut output = Vec::new();
    let service = Service {
        input: "type,account,amount,target,kind\n\
                open,alice,100,,\n\
                open,spare,0,,\n\
                withdraw,alice,30,,\n\
                transfer,alice,10,spare,\n"
            .as_bytes(),
        output: &mut output,
        report: Report::History,
        error_printer: collecting_printer(&rejections),
    };
    service.run(&mut session).unwrap();
    assert!(rejections.borrow().is_empty());

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        [
            "account,type,amount,fee,timestamp",
            "spare,transfer-in,10,0,2025-07-01T09:00:00Z",
            "alice,transfer-out,10,0.10,2025-07-01T09:00:00Z",
            "alice,withdraw,30,0,2025-07-01T09:00:00Z",
        ]
    );
}

#[test]
fn premium_upgrade_through_service() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let mut session = in_memory_session(clock);
    let rejections = Rejections::default();
    let mut output = Vec::new();
    let service = Service {
        input: "type,account,amount,target,kind\n\
                open,savings,200,,savings\n\
                upgrade,,,,\n\
                upgrade,,,,\n\
                withdraw,savings,50,,\n\
                deposit,savings,100,,\n"
            .as_bytes(),
        output: &mut output,
        report: Report::Balances,
        error_printer: collecting_printer(&rejections),
    };
    service.run(&mut session).unwrap();
    assert!(rejections.borrow().is_empty());
    assert!(session.is_premium().unwrap());

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(lines, ["account,type,balance", "savings,SavingsAcct,255.00"]);
}

#[test]
fn file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let open = |clock: Arc<ManualClock>| {
        Session::open(
            "alice",
            Stores {
                ledger: JsonLedgerStore::new(dir.path()).unwrap(),
                log: CsvTransactionLog::new(dir.path().join("transactions.csv")),
                premium: JsonPremiumStore::new(dir.path().join("premium_members.json")),
            },
            clock,
            LedgerConfig::default(),
        )
        .unwrap()
    };

    {
        let mut session = open(clock.clone());
        let rejections = Rejections::default();
        let mut output = Vec::new();
        Service {
            input: "type,account,amount,target,kind\n\
                    open,alice,100,,\n\
                    withdraw,alice,30,,\n\
                    withdraw,alice,100,,\n"
                .as_bytes(),
            output: &mut output,
            report: Report::Balances,
            error_printer: collecting_printer(&rejections),
        }
        .run(&mut session)
        .unwrap();
        assert_eq!(rejections.borrow().len(), 1);
    }

    let session = open(clock);
    assert_eq!(session.balance("alice"), Some(dec!(70)));
    let history = session.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, dec!(30));
    assert_eq!(history[0].fee, dec!(0));
}

#[test]
fn insufficient_funds_error_keeps_detail() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let mut session = in_memory_session(clock);
    let errors: Rc<RefCell<Vec<RowError>>> = Rc::default();
    let sink = errors.clone();
    let mut output = Vec::new();
    Service {
        input: "type,account,amount,target,kind\n\
                open,alice,10,,\n\
                open,other,0,,\n\
                transfer,alice,15,other,\n"
            .as_bytes(),
        output: &mut output,
        report: Report::Balances,
        error_printer: Box::new(move |_, err| sink.borrow_mut().push(err)),
    }
    .run(&mut session)
    .unwrap();

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    let RowError::Process(TransactionProcessError::AccountErr(err)) = &errors[0] else {
        panic!("unexpected error {:?}", errors[0]);
    };
    assert_eq!(err.insufficient_funds().unwrap().name, "alice");
    assert_eq!(err.insufficient_funds().unwrap().balance, dec!(10));
}

#[test]
fn oversized_amount_row_is_rejected() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    ));
    let mut session = in_memory_session(clock);
    let rejections = Rejections::default();
    let mut output = Vec::new();
    let service = Service {
        input: "type,account,amount,target,kind\n\
                open,i,0,,interest\n\
                deposit,i,76000000000000000000000000000.5,,\n\
                deposit,i,10,,\n"
            .as_bytes(),
        output: &mut output,
        report: Report::Balances,
        error_printer: collecting_printer(&rejections),
    };
    service.run(&mut session).unwrap();

    let rejections = rejections.borrow();
    let messages: Vec<&str> = rejections.iter().map(|(_, msg)| msg.as_str()).collect();
    assert_eq!(messages, ["Amount is too large for 'i'"]);
    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(lines, ["account,type,balance", "i,InterestRewardAcct,10.50"]);
}
