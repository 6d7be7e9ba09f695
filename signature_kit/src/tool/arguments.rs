//! Configuration to invocation arguments

use super::flags::{
    Flag, DEFAULT_INCLUDE_SIGNATURE_VERSION, DEFAULT_INPUT_KOTLIN_NULLS,
    DEFAULT_OUTPUT_DEFAULT_VALUES, DEFAULT_OUTPUT_KOTLIN_NULLS, SOURCE_PATH_SEPARATOR,
};
use crate::config::Configuration;

/// Build the ordered argument list for one invocation
///
/// Total and side-effect free. The order is fixed:
/// banner, source path, language level, format, visibility, output,
/// toggles, hidden packages, hidden annotations, escalation switches.
pub fn build(config: &Configuration) -> Vec<String> {
    let mut args = vec![Flag::NoBanner.spelling().to_string()];

    if !config.source_paths().is_empty() {
        let separator = SOURCE_PATH_SEPARATOR.to_string();
        let joined = config
            .source_paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(separator.as_str());
        args.push(Flag::SourcePath.spelling().to_string());
        args.push(joined);
    }

    args.push(Flag::JavaSource.spelling().to_string());
    args.push(config.java_source_level().as_str().to_string());

    args.push(Flag::Format.with_value(config.format().as_str()));

    if let Some(flag) = Flag::for_visibility(config.documentation()) {
        args.push(flag.spelling().to_string());
    }

    args.push(Flag::for_signature(config.signature_kind()).spelling().to_string());
    args.push(config.output_path().display().to_string());

    let toggles = [
        (
            Flag::OutputKotlinNulls,
            config.output_kotlin_nulls(),
            DEFAULT_OUTPUT_KOTLIN_NULLS,
        ),
        (
            Flag::InputKotlinNulls,
            config.input_kotlin_nulls(),
            DEFAULT_INPUT_KOTLIN_NULLS,
        ),
        (
            Flag::OutputDefaultValues,
            config.output_default_values(),
            DEFAULT_OUTPUT_DEFAULT_VALUES,
        ),
        (
            Flag::IncludeSignatureVersion,
            config.include_signature_version(),
            DEFAULT_INCLUDE_SIGNATURE_VERSION,
        ),
    ];
    for (flag, value, default) in toggles {
        if value != default {
            args.push(flag.toggle(value));
        }
    }

    // BTreeSet iteration is already lexicographic
    for package in config.hidden_packages() {
        args.push(Flag::HidePackage.spelling().to_string());
        args.push(package.clone());
    }
    for annotation in config.hidden_annotations() {
        args.push(Flag::HideAnnotation.spelling().to_string());
        args.push(annotation.clone());
    }

    if config.report_warnings_as_errors() {
        args.push(Flag::WarningsAsErrors.spelling().to_string());
    }
    if config.report_lints_as_errors() {
        args.push(Flag::LintsAsErrors.spelling().to_string());
    }

    log::debug!("Built {} tool arguments", args.len());
    args
}
