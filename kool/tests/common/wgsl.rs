use naga::Module;
use naga::front::wgsl;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

/// Parses `source`, printing naga's diagnostic before failing the test.
pub fn parse(source: &str) -> Module {
    match wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => {
            e.emit_to_stderr(source);
            panic!("generated WGSL doesn't parse");
        }
    }
}

/// Parses and validates `source` with every capability enabled.
pub fn validate(source: &str) -> ModuleInfo {
    let module = parse(source);
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    match validator.validate(&module) {
        Ok(info) => info,
        Err(e) => {
            e.emit_to_stderr(source);
            panic!("generated WGSL doesn't validate");
        }
    }
}
