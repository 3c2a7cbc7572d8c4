use crate::test;
use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};

// Emits results.xml when TB_JUNIT is set. The harness usually runs under
// `cargo test`, where an unconditional artifact in the working directory is
// unwanted.
pub(crate) fn create_junit_xml() {
    if std::env::var_os("TB_JUNIT").is_none() {
        return;
    }
    let mut test_cases = Vec::new();

    for t in test::test_list().iter().map(|obj| obj.get()) {
        let tc = match t.result.as_ref() {
            Some(Ok(_)) => TestCaseBuilder::success(&t.name, Duration::seconds_f64(t.time_secs)),
            Some(Err(e)) => TestCaseBuilder::failure(
                &t.name,
                Duration::seconds_f64(t.time_secs),
                "failure",
                &format!("{:?}", e),
            ),
            None => TestCaseBuilder::failure(
                &t.name,
                Duration::seconds_f64(t.time_secs),
                "failure",
                "test did not complete",
            ),
        }
        .build();
        test_cases.push(tc);
    }

    let suite_name = crate::CRATE_NAME
        .get()
        .map(|s| s.as_str())
        .unwrap_or("player_fsm_tb");
    let test_suite = TestSuiteBuilder::new(suite_name)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create("results.xml").unwrap();
    report.write_xml(file).unwrap();
}
