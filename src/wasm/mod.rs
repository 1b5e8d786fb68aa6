//! Post-processing of the Wasm artifact produced by `cargo build`.
//!
//! Only the contract entrypoints survive: every export outside the list is
//! dropped and whatever it alone reached (functions, globals, imports) is
//! tree-shaken away by `pwasm_utils`. Custom sections carry nothing the
//! chain needs and are removed as well.

use anyhow::Context;
use parity_wasm::elements::{Module, Section};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WasmError {
    #[error("Invalid Wasm module: {0}")]
    Codec(#[from] parity_wasm::elements::Error),
    #[error("Tree-shaking the Wasm module failed: {0}")]
    Optimizer(String),
}

/// Sizes reported after post-processing, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessReport {
    pub original_size: u64,
    pub processed_size: u64,
    pub removed_functions: usize,
    pub removed_custom_sections: usize,
}

/// Removes all custom sections, including parsed `name` and `reloc.*` ones.
pub fn strip_custom_sections(module: &mut Module) -> usize {
    let before = module.sections().len();
    module
        .sections_mut()
        .retain(|section| !matches!(section, Section::Custom(_) | Section::Name(_) | Section::Reloc(_)));
    before - module.sections().len()
}

/// Keeps only `entrypoints` among the exports and drops everything they do
/// not transitively use. Returns the number of functions removed.
///
/// A listed entrypoint the module does not export is only reported.
pub fn shake(module: &mut Module, entrypoints: &[String]) -> Result<usize, WasmError> {
    let exported = export_names(module);
    for entrypoint in entrypoints {
        if !exported.contains(entrypoint) {
            tracing::warn!(%entrypoint, "entrypoint is not exported by the contract");
        }
    }

    let before = function_count(module);
    pwasm_utils::optimize(module, entrypoints.iter().map(String::as_str).collect())
        .map_err(|e| WasmError::Optimizer(format!("{e:?}")))?;
    Ok(before.saturating_sub(function_count(module)))
}

pub fn export_names(module: &Module) -> Vec<String> {
    module
        .export_section()
        .map(|exports| {
            exports
                .entries()
                .iter()
                .map(|entry| entry.field().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Functions defined by the module, imports excluded.
pub fn function_count(module: &Module) -> usize {
    module
        .function_section()
        .map_or(0, |functions| functions.entries().len())
}

/// Reads `original`, tree-shakes it down to the contract entrypoints, strips
/// custom sections and writes the result to `dest`.
pub async fn post_process_wasm(
    original: &Path,
    dest: &Path,
    entrypoints: &[String],
) -> anyhow::Result<PostProcessReport> {
    let bytes = tokio::fs::read(original)
        .await
        .with_context(|| format!("Loading original wasm file '{}'", original.display()))?;
    let mut module = parity_wasm::deserialize_buffer::<Module>(&bytes)
        .map_err(WasmError::from)
        .with_context(|| format!("Parsing wasm file '{}'", original.display()))?;

    let removed_functions = shake(&mut module, entrypoints)?;
    let removed_custom_sections = strip_custom_sections(&mut module);

    let processed = parity_wasm::serialize(module).map_err(WasmError::from)?;
    tokio::fs::write(dest, &processed)
        .await
        .with_context(|| format!("Writing wasm file '{}'", dest.display()))?;

    tracing::info!(
        removed_functions,
        removed_custom_sections,
        original_size = bytes.len(),
        processed_size = processed.len(),
        "post-processed wasm artifact"
    );

    Ok(PostProcessReport {
        original_size: bytes.len() as u64,
        processed_size: processed.len() as u64,
        removed_functions,
        removed_custom_sections,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use parity_wasm::builder;
    use parity_wasm::elements::{CustomSection, Instruction, Instructions, Section};

    fn body(instructions: Vec<Instruction>) -> Instructions {
        Instructions::new(instructions)
    }

    /// A contract as rustc leaves it: `deploy` and `call` share a callee,
    /// `helper` is exported but dead once the entrypoints are selected, and
    /// the linker added memory and custom sections.
    pub fn contract_module() -> Vec<u8> {
        let module = builder::module()
            // 0: deploy
            .function()
            .signature()
            .build()
            .body()
            .with_instructions(body(vec![Instruction::Call(3), Instruction::End]))
            .build()
            .build()
            // 1: call
            .function()
            .signature()
            .build()
            .body()
            .with_instructions(body(vec![Instruction::Call(3), Instruction::End]))
            .build()
            .build()
            // 2: helper
            .function()
            .signature()
            .build()
            .body()
            .with_instructions(body(vec![Instruction::Nop, Instruction::End]))
            .build()
            .build()
            // 3: shared by the entrypoints
            .function()
            .signature()
            .build()
            .body()
            .with_instructions(body(vec![Instruction::End]))
            .build()
            .build()
            .memory()
            .with_min(1)
            .build()
            .export()
            .field("deploy")
            .internal()
            .func(0)
            .build()
            .export()
            .field("call")
            .internal()
            .func(1)
            .build()
            .export()
            .field("helper")
            .internal()
            .func(2)
            .build()
            .export()
            .field("memory")
            .internal()
            .memory(0)
            .build()
            .with_section(Section::Custom(CustomSection::new(
                "producers".to_string(),
                b"\x01\x0cprocessed-by\x01\x05rustc\x061.83.0".to_vec(),
            )))
            .with_section(Section::Custom(CustomSection::new(
                "target_features".to_string(),
                b"\x01\x2b\x0fmutable-globals".to_vec(),
            )))
            .build();
        parity_wasm::serialize(module).unwrap()
    }
}
