use std::str::FromStr;

use cranelift_codegen::isa::{self, OwnedTargetIsa};
use cranelift_codegen::settings;
use once_cell::sync::OnceCell;
use target_lexicon::Triple;
use tracing::debug;

use crate::codegen::{CodegenError, Target};

/// Host ISA, built once per process.
static HOST_ISA: OnceCell<OwnedTargetIsa> = OnceCell::new();

/// Resolve `target` into an ISA with default settings.
pub(crate) fn resolve_isa(target: &Target) -> Result<OwnedTargetIsa, CodegenError> {
    match target {
        Target::Host => HOST_ISA
            .get_or_try_init(|| {
                // Generic CPU: do not probe the host for optional features.
                let builder = cranelift_native::builder_with_options(false).map_err(|reason| {
                    CodegenError::UnsupportedTarget {
                        triple: "host".to_string(),
                        reason: reason.to_string(),
                    }
                })?;
                finish(builder, "host")
            })
            .cloned(),
        Target::Triple(triple) => {
            let unsupported = |reason: String| CodegenError::UnsupportedTarget {
                triple: triple.clone(),
                reason,
            };
            let parsed = Triple::from_str(triple).map_err(|err| unsupported(err.to_string()))?;
            let builder = isa::lookup(parsed).map_err(|err| unsupported(err.to_string()))?;
            finish(builder, triple)
        }
    }
}

fn finish(builder: isa::Builder, triple: &str) -> Result<OwnedTargetIsa, CodegenError> {
    let flags = settings::Flags::new(settings::builder());
    let isa = builder
        .finish(flags)
        .map_err(|err| CodegenError::UnsupportedTarget {
            triple: triple.to_string(),
            reason: err.to_string(),
        })?;
    debug!(target = %isa.triple(), "resolved target isa");
    Ok(isa)
}
