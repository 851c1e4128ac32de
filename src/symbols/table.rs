use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::StatKind;
use crate::imaging::store::ImageScope;
use std::collections::BTreeMap;

/// Index of a variable in per-worker storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarSlot(pub u32);

/// Index of a constant in the symbol table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstId(pub u32);

/// A resolved symbol name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolId {
    /// Mutable variable (local or global).
    Variable(VarSlot),
    /// Immutable constant.
    Constant(ConstId),
}

/// Reduction applied when merging a global variable's per-worker values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GlobalOp {
    /// Sum of worker contributions; requires `+=` or `-=` assignments.
    Add,
    /// Product of worker contributions; requires `*=` or `/=` assignments.
    Mul,
}

impl GlobalOp {
    /// Neutral element of the reduction.
    pub fn identity(self) -> f64 {
        match self {
            GlobalOp::Add => 0.0,
            GlobalOp::Mul => 1.0,
        }
    }

    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            GlobalOp::Add => a + b,
            GlobalOp::Mul => a * b,
        }
    }

    pub(crate) fn symbol(self) -> char {
        match self {
            GlobalOp::Add => '+',
            GlobalOp::Mul => '*',
        }
    }
}

/// A declared variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDef {
    /// Identifier.
    pub name: String,
    /// Initial value.
    pub init: Pixel,
    /// Reduction for global variables, `None` for worker-local ones.
    pub global: Option<GlobalOp>,
}

impl VariableDef {
    /// Value a worker's storage slot starts from.
    ///
    /// Global variables start from the reduction identity; the declared initial value is applied
    /// once when the worker slots are merged.
    pub(crate) fn worker_init(&self) -> Pixel {
        match self.global {
            Some(op) => Pixel::gray(op.identity()),
            None => self.init,
        }
    }
}

/// How a constant obtains its value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    /// Immediate value.
    Immediate(Pixel),
    /// Width of an image (the target when `None`).
    Width(Option<String>),
    /// Height of an image.
    Height(Option<String>),
    /// Pixel count of an image.
    Area(Option<String>),
    /// Reciprocal pixel count of an image.
    InvArea(Option<String>),
    /// 1 for colour images, 0 for gray ones.
    IsColor(Option<String>),
    /// Whole-image statistic.
    Statistic {
        /// Statistic to compute.
        kind: StatKind,
        /// Image (the target when `None`).
        image: Option<String>,
        /// Channel, or every nominal channel when `None`.
        channel: Option<usize>,
    },
    /// Sample of an image at fixed coordinates (0 outside the image).
    PixelAt {
        /// Image (the target when `None`).
        image: Option<String>,
        /// Column.
        x: i64,
        /// Row.
        y: i64,
        /// Channel, or the nominal pixel when `None`.
        channel: Option<usize>,
    },
    /// Numeric value of an environment variable.
    EnvValue(String),
    /// 1 when an environment variable is set, 0 otherwise.
    EnvDefined(String),
}

impl ConstValue {
    /// Compute the constant's value.
    pub(crate) fn resolve(&self, scope: &ImageScope<'_>) -> PixelMathResult<Pixel> {
        let dims = |id: &Option<String>| -> PixelMathResult<(f64, f64, bool)> {
            let r = scope.find(id.as_deref())?;
            Ok((f64::from(r.width()), f64::from(r.height()), r.is_color()))
        };
        let v = match self {
            ConstValue::Immediate(p) => *p,
            ConstValue::Width(id) => Pixel::gray(dims(id)?.0),
            ConstValue::Height(id) => Pixel::gray(dims(id)?.1),
            ConstValue::Area(id) => {
                let (w, h, _) = dims(id)?;
                Pixel::gray(w * h)
            }
            ConstValue::InvArea(id) => {
                let (w, h, _) = dims(id)?;
                Pixel::gray(1.0 / (w * h))
            }
            ConstValue::IsColor(id) => Pixel::gray(if dims(id)?.2 { 1.0 } else { 0.0 }),
            ConstValue::Statistic {
                kind,
                image,
                channel,
            } => scope
                .find(image.as_deref())?
                .statistic_pixel(*kind, *channel)
                .map_err(PixelMathError::compile)?,
            ConstValue::PixelAt {
                image,
                x,
                y,
                channel,
            } => {
                let r = scope.find(image.as_deref())?;
                if let Some(c) = channel
                    && *c >= r.channels()
                {
                    return Err(PixelMathError::compile(format!(
                        "pixel(): channel index out of range: {c}"
                    )));
                }
                if !r.includes(*x, *y) {
                    Pixel::gray(0.0)
                } else {
                    let (x, y) = (*x as u32, *y as u32);
                    match channel {
                        Some(c) => Pixel::gray(r.sample(x, y, *c)),
                        None => r.pixel(x, y),
                    }
                }
            }
            ConstValue::EnvValue(name) => {
                let raw = std::env::var(name).map_err(|_| {
                    PixelMathError::compile(format!("environment variable '{name}' is not defined"))
                })?;
                let v = raw.trim().parse::<f64>().map_err(|_| {
                    PixelMathError::compile(format!(
                        "environment variable '{name}' is not numeric: '{raw}'"
                    ))
                })?;
                Pixel::gray(v)
            }
            ConstValue::EnvDefined(name) => {
                Pixel::gray(if std::env::var_os(name).is_some() { 1.0 } else { 0.0 })
            }
        };
        Ok(v)
    }
}

/// A declared constant.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantDef {
    /// Identifier.
    pub name: String,
    /// Value source.
    pub value: ConstValue,
}

/// Final value of a global variable after all workers have joined.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalReport {
    /// Identifier.
    pub name: String,
    /// Value; gray results are replicated into the three components.
    pub value: [f64; 3],
}

/// Variables, global variables and constants visible to expressions.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    variables: Vec<VariableDef>,
    constants: Vec<ConstantDef>,
    names: BTreeMap<String, SymbolId>,
}

impl SymbolTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_new_name(&self, name: &str) -> PixelMathResult<()> {
        if !is_valid_identifier(name) {
            return Err(PixelMathError::compile(format!(
                "invalid symbol identifier '{name}'"
            )));
        }
        if self.names.contains_key(name) {
            return Err(PixelMathError::compile(format!(
                "duplicate symbol identifier '{name}'"
            )));
        }
        Ok(())
    }

    /// Declare a worker-local variable.
    pub fn declare_variable(&mut self, name: &str, init: f64) -> PixelMathResult<VarSlot> {
        self.push_variable(VariableDef {
            name: name.to_string(),
            init: Pixel::gray(init),
            global: None,
        })
    }

    /// Declare a global variable; `init` defaults to the reduction identity.
    pub fn declare_global(
        &mut self,
        name: &str,
        op: GlobalOp,
        init: Option<f64>,
    ) -> PixelMathResult<VarSlot> {
        self.push_variable(VariableDef {
            name: name.to_string(),
            init: Pixel::gray(init.unwrap_or(op.identity())),
            global: Some(op),
        })
    }

    fn push_variable(&mut self, def: VariableDef) -> PixelMathResult<VarSlot> {
        self.check_new_name(&def.name)?;
        let slot = VarSlot(self.variables.len() as u32);
        self.names
            .insert(def.name.clone(), SymbolId::Variable(slot));
        self.variables.push(def);
        Ok(slot)
    }

    /// Declare a constant.
    pub fn declare_constant(&mut self, name: &str, value: ConstValue) -> PixelMathResult<ConstId> {
        self.check_new_name(name)?;
        let id = ConstId(self.constants.len() as u32);
        self.names.insert(name.to_string(), SymbolId::Constant(id));
        self.constants.push(ConstantDef {
            name: name.to_string(),
            value,
        });
        Ok(id)
    }

    /// Resolve a name.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    /// Variable definition for a slot.
    pub fn variable(&self, slot: VarSlot) -> Option<&VariableDef> {
        self.variables.get(slot.0 as usize)
    }

    /// Constant definition for an id.
    pub fn constant(&self, id: ConstId) -> Option<&ConstantDef> {
        self.constants.get(id.0 as usize)
    }

    /// All variables in slot order.
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// Fresh per-worker variable storage.
    pub(crate) fn worker_storage(&self) -> Vec<Pixel> {
        self.variables.iter().map(VariableDef::worker_init).collect()
    }

    /// Merge per-worker storages (in worker order) into the final global variable values.
    pub(crate) fn merge_globals(&self, workers: &[Vec<Pixel>]) -> Vec<GlobalReport> {
        let mut out = Vec::new();
        for (i, def) in self.variables.iter().enumerate() {
            let Some(op) = def.global else {
                continue;
            };
            let mut acc = def.init;
            for storage in workers {
                let v = storage[i];
                if v.is_color() {
                    acc = acc.to_color();
                }
                let mut merged = acc;
                Pixel::fill(&mut merged, |c| op.apply(acc.get(c), v.get(c)));
                acc = merged;
            }
            out.push(GlobalReport {
                name: def.name.clone(),
                value: [acc.get(0), acc.get(1), acc.get(2)],
            });
        }
        out
    }
}

pub(crate) fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "../../tests/unit/symbols/table.rs"]
mod tests;
