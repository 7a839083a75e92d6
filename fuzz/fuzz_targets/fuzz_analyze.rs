#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    // Any readable configuration must analyze without panicking, and the
    // resulting artifact must parse back.
    if let Ok(report) = formdebug::analyze(input, None, None) {
        let json = formdebug::serialize_findings(&report.findings).expect("findings serialize");
        let parsed = formdebug::parse_findings(&json).expect("artifact parses");
        assert_eq!(parsed.len(), report.findings.len());
    }
});
