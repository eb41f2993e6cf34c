use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use hybris_value::{ExternFn, ExternValue, Value};

type Library = FxHashMap<String, ExternFn>;

/// Native libraries callable from scripts through `dllopen`/`dlllink`.
///
/// Libraries are provided by the host as named tables of Rust functions.
/// `dllopen` only succeeds for registered libraries, and `dlllink` hands
/// out [`ExternValue`]s pointing at their entries.
#[derive(Default)]
pub struct ExternRegistry {
    libraries: RwLock<FxHashMap<String, Library>>,
}

impl ExternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `libm` host library (`sqrt`, `pow`, `floor`,
    /// `ceil`, `fabs`).
    pub fn with_host_libraries() -> Self {
        let registry = Self::new();
        registry.register("libm", "sqrt", unary_float(f64::sqrt));
        registry.register("libm", "floor", unary_float(f64::floor));
        registry.register("libm", "ceil", unary_float(f64::ceil));
        registry.register("libm", "fabs", unary_float(f64::abs));
        registry.register(
            "libm",
            "pow",
            Arc::new(|args: &[Value]| match args {
                [base, exp] => Ok(Value::Float(float_arg(base)?.powf(float_arg(exp)?))),
                _ => Err(format!("pow expects 2 arguments, got {}", args.len())),
            }),
        );
        registry
    }

    pub fn register(&self, library: &str, name: &str, function: ExternFn) {
        self.libraries
            .write()
            .entry(library.to_string())
            .or_default()
            .insert(name.to_string(), function);
    }

    pub fn has_library(&self, library: &str) -> bool {
        self.libraries.read().contains_key(library)
    }

    /// Resolve `name` in `library`.
    pub fn link(&self, library: &str, name: &str) -> Option<ExternValue> {
        let libraries = self.libraries.read();
        let function = libraries.get(library)?.get(name)?.clone();
        Some(ExternValue {
            library: library.to_string(),
            name: name.to_string(),
            function,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn float_arg(value: &Value) -> Result<f64, String> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Integer(n) => Ok(*n as f64),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

fn unary_float(f: fn(f64) -> f64) -> ExternFn {
    Arc::new(move |args: &[Value]| match args {
        [x] => Ok(Value::Float(f(float_arg(x)?))),
        _ => Err(format!("expected 1 argument, got {}", args.len())),
    })
}
