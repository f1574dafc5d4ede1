//! End-to-end reconciliation tests against a scripted runner.

use std::cell::RefCell;

use svcrec::{
    CollectingSink, DesiredRecovery, FailureAction, FailureActionKind, ReconcileSession,
    RecoveryError, ScRunner,
};

enum Scripted {
    Ok(String),
    Fail(i32, String),
}

/// Runner that replays scripted responses and records every invocation.
struct FakeRunner {
    responses: RefCell<Vec<Scripted>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            responses: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn respond_ok(self, output: &str) -> Self {
        self.responses
            .borrow_mut()
            .push(Scripted::Ok(output.to_string()));
        self
    }

    fn respond_fail(self, status: i32, output: &str) -> Self {
        self.responses
            .borrow_mut()
            .push(Scripted::Fail(status, output.to_string()));
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl ScRunner for FakeRunner {
    fn run(&self, args: &[&str]) -> Result<String, RecoveryError> {
        self.calls
            .borrow_mut()
            .push(args.iter().map(|arg| arg.to_string()).collect());
        let mut responses = self.responses.borrow_mut();
        assert!(!responses.is_empty(), "unscripted call: {:?}", args);
        match responses.remove(0) {
            Scripted::Ok(output) => Ok(output),
            Scripted::Fail(status, output) => Err(RecoveryError::CommandFailed {
                command: args.join(" "),
                status,
                output,
            }),
        }
    }
}

const EMPTY_STATUS: &str = "[SC] QueryServiceConfig2 SUCCESS

SERVICE_NAME: spooler";

const CONFIGURED_STATUS: &str = "[SC] QueryServiceConfig2 SUCCESS

SERVICE_NAME: spooler
        RESET_PERIOD (in seconds)    : 300
        FAILURE_ACTIONS              : RESTART -- Delay = 1000 milliseconds.
                                       REBOOT -- Delay = 5000 milliseconds.";

#[test]
fn test_in_sync_service_issues_no_mutation() {
    let runner = FakeRunner::new().respond_ok(CONFIGURED_STATUS);
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        reset_period: Some(300),
        failure_actions: vec![
            FailureAction::new(FailureActionKind::Restart, 1000),
            FailureAction::new(FailureActionKind::Reboot, 5000),
        ],
        ..Default::default()
    };

    let mut sink = CollectingSink::default();
    let plan = session
        .reconcile("spooler", &desired, false, &mut sink)
        .unwrap();

    assert!(plan.is_noop());
    assert!(sink.changes.is_empty());
    // Only the status read happened.
    let calls = session.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec!["qfailure", "spooler"]);
}

#[test]
fn test_apply_sends_exact_failure_command() {
    let runner = FakeRunner::new().respond_ok(EMPTY_STATUS).respond_ok("");
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        reset_period: Some(86400),
        reboot_message: Some("going down".to_string()),
        command: Some("C:\\recovery\\notify.cmd".to_string()),
        failure_actions: vec![FailureAction::new(FailureActionKind::Restart, 5000)],
    };

    let mut sink = CollectingSink::default();
    let plan = session
        .reconcile("spooler", &desired, false, &mut sink)
        .unwrap();

    assert!(!plan.is_noop());
    let calls = session.runner().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        vec![
            "failure",
            "spooler",
            "reboot=\"going down\"",
            "command=\"C:\\recovery\\notify.cmd\"",
            "reset=86400",
            "actions=restart/5000/",
        ]
    );
    assert_eq!(sink.changes.len(), 4);
}

#[test]
fn test_reset_only_change_keeps_current_actions() {
    let runner = FakeRunner::new().respond_ok(CONFIGURED_STATUS).respond_ok("");
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        reset_period: Some(600),
        ..Default::default()
    };

    let mut sink = CollectingSink::default();
    session
        .reconcile("spooler", &desired, false, &mut sink)
        .unwrap();

    let calls = session.runner().calls();
    assert_eq!(
        calls[1],
        vec![
            "failure",
            "spooler",
            "reset=600",
            "actions=restart/1000/reboot/5000/",
        ]
    );
    // The untouched action list is re-sent but not reported as changed.
    assert_eq!(sink.changes.len(), 1);
    assert_eq!(sink.changes[0].attribute, "reset_period");
    assert_eq!(sink.changes[0].old.as_deref(), Some("300"));
    assert_eq!(sink.changes[0].new, "600");
}

#[test]
fn test_actions_only_change_falls_back_to_reset_zero() {
    let runner = FakeRunner::new().respond_ok(EMPTY_STATUS).respond_ok("");
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        failure_actions: vec![FailureAction::new(FailureActionKind::RunCommand, 2000)],
        ..Default::default()
    };

    let mut sink = CollectingSink::default();
    session
        .reconcile("spooler", &desired, false, &mut sink)
        .unwrap();

    let calls = session.runner().calls();
    assert_eq!(
        calls[1],
        vec!["failure", "spooler", "reset=0", "actions=run/2000/"]
    );
    assert_eq!(sink.changes.len(), 1);
    assert_eq!(sink.changes[0].attribute, "failure_actions");
}

#[test]
fn test_dry_run_never_mutates() {
    let runner = FakeRunner::new().respond_ok(EMPTY_STATUS);
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        reset_period: Some(60),
        ..Default::default()
    };

    let mut sink = CollectingSink::default();
    let plan = session
        .reconcile("spooler", &desired, true, &mut sink)
        .unwrap();

    assert!(!plan.is_noop());
    // Status read only; the mutation was described, not executed.
    assert_eq!(session.runner().calls().len(), 1);
    // Dry-run still reports what would change.
    assert_eq!(sink.changes.len(), 1);
    assert_eq!(sink.changes[0].attribute, "reset_period");
}

#[test]
fn test_failed_mutation_notifies_nothing() {
    let runner = FakeRunner::new()
        .respond_ok(EMPTY_STATUS)
        .respond_fail(5, "Access is denied.");
    let session = ReconcileSession::new(runner);
    let desired = DesiredRecovery {
        reset_period: Some(60),
        ..Default::default()
    };

    let mut sink = CollectingSink::default();
    let err = session
        .reconcile("spooler", &desired, false, &mut sink)
        .unwrap_err();

    match err {
        RecoveryError::CommandFailed { status, output, .. } => {
            assert_eq!(status, 5);
            assert!(output.contains("denied"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.changes.is_empty());
}

#[test]
fn test_query_failure_propagates() {
    let runner = FakeRunner::new().respond_fail(1, "RPC server unavailable");
    let mut session = ReconcileSession::new(runner);
    let err = session.services().unwrap_err();
    assert!(matches!(err, RecoveryError::CommandFailed { .. }));
}

const QUERY_OUTPUT: &str = "SERVICE_NAME: Spooler
DISPLAY_NAME: Print Spooler
        STATE              : 4  RUNNING

SERVICE_NAME: wuauserv
DISPLAY_NAME: Windows Update
        STATE              : 1  STOPPED";

#[test]
fn test_service_list_is_memoized() {
    let runner = FakeRunner::new().respond_ok(QUERY_OUTPUT);
    let mut session = ReconcileSession::new(runner);

    assert_eq!(session.services().unwrap().len(), 2);
    assert_eq!(session.services().unwrap().len(), 2);
    assert!(session.service_exists("wuauserv").unwrap());
    // One query backed all three lookups.
    assert_eq!(session.runner().calls().len(), 1);
}

#[test]
fn test_service_exists_ignores_case() {
    let runner = FakeRunner::new().respond_ok(QUERY_OUTPUT);
    let mut session = ReconcileSession::new(runner);

    assert!(session.service_exists("spooler").unwrap());
    assert!(session.service_exists("SPOOLER").unwrap());
    assert!(!session.service_exists("nosuch").unwrap());
}

#[test]
fn test_fetch_all_reads_every_service() {
    let runner = FakeRunner::new()
        .respond_ok(QUERY_OUTPUT)
        .respond_ok(CONFIGURED_STATUS)
        .respond_ok(EMPTY_STATUS);
    let mut session = ReconcileSession::new(runner);

    let configs = session.fetch_all().unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].name(), "Spooler");
    assert_eq!(configs[0].reset_period, Some(300));
    assert_eq!(configs[1].name(), "wuauserv");
    assert!(!configs[1].is_configured());

    let calls = session.runner().calls();
    assert_eq!(calls[0], vec!["query"]);
    assert_eq!(calls[1], vec!["qfailure", "Spooler"]);
    assert_eq!(calls[2], vec!["qfailure", "wuauserv"]);
}

#[test]
fn test_no_action_steps_never_converge() {
    // The status format cannot represent a no-action step, so a desired
    // list containing one differs from read-back state forever. Each pass
    // re-sends the same mutation.
    let desired = DesiredRecovery {
        failure_actions: vec![
            FailureAction::new(FailureActionKind::Restart, 5000),
            FailureAction::new(FailureActionKind::Noop, 0),
        ],
        ..Default::default()
    };
    let after_apply = "[SC] QueryServiceConfig2 SUCCESS

SERVICE_NAME: spooler
        RESET_PERIOD (in seconds)    : 0
        FAILURE_ACTIONS              : RESTART -- Delay = 5000 milliseconds.";

    for pass in 0..2 {
        let output = if pass == 0 { EMPTY_STATUS } else { after_apply };
        let runner = FakeRunner::new().respond_ok(output).respond_ok("");
        let session = ReconcileSession::new(runner);
        let mut sink = CollectingSink::default();
        let plan = session
            .reconcile("spooler", &desired, false, &mut sink)
            .unwrap();
        assert!(!plan.is_noop(), "pass {pass} unexpectedly converged");
        let calls = session.runner().calls();
        assert_eq!(
            calls[1],
            vec!["failure", "spooler", "reset=0", "actions=restart/5000//0/"]
        );
    }
}
