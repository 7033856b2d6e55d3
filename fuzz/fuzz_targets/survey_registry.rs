#![no_main]

use concordia::config::AnalysisConfig;
use concordia::survey::SurveyRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary registry and config text must be rejected, never panic
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = SurveyRegistry::from_toml_str(input);
        let _ = AnalysisConfig::from_toml_str(input);
    }
});
