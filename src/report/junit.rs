use super::types::RunResults;
use crate::runner::status::TestStatus;
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML report string from RunResults
pub fn generate_junit_xml(results: &RunResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = results.tests.len();
    let failures = results
        .tests
        .iter()
        .filter(|t| t.status == TestStatus::Failed)
        .count();
    let skipped = 0;
    let total_duration: u64 = results.tests.iter().map(|t| t.duration_ms).sum();

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "bookwright-run"));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suites_start.push_attribute((
        "time",
        (total_duration as f64 / 1000.0).to_string().as_str(),
    ));
    writer.write_event(Event::Start(suites_start))?;

    // Single <testsuite> per run; one suite covers the whole booking flow set
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", results.environment.as_str()));
    suite_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute((
        "time",
        (total_duration as f64 / 1000.0).to_string().as_str(),
    ));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for test in &results.tests {
        write_test_case(&mut writer, test, &results.environment)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    test: &crate::runner::status::TestSummary,
    environment: &str,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    let classname = format!("booking.{}", environment);

    case_start.push_attribute(("name", test.name.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute((
        "time",
        (test.duration_ms as f64 / 1000.0).to_string().as_str(),
    ));

    writer.write_event(Event::Start(case_start))?;

    if test.status == TestStatus::Failed {
        let message = if test.failure_reason.is_empty() {
            "Unknown error"
        } else {
            test.failure_reason.as_str()
        };
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", message));
        fail_start.push_attribute(("type", "AssertionError"));
        writer.write_event(Event::Start(fail_start))?;
        writer.write_event(Event::Text(quick_xml::events::BytesText::new(message)))?;
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(results: &RunResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}
