use crate::expression::builtins;
use crate::expression::generators::GeneratorArgs;
use crate::expression::node::Expr;
use crate::expression::vm::{EvalCtx, EvalResult, Operand};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::Raster;
use std::fmt;
use std::sync::LazyLock;

/// Per-pixel evaluation. `out` arrives shaped gray or RGB after operand promotion; functions that
/// force their result shape overwrite it.
pub type EvalFn = fn(&mut Pixel, &mut [Operand<'_>], &mut EvalCtx<'_>) -> EvalResult;

/// Whole-image synthesis for image generators.
pub type GenerateFn = fn(&GeneratorArgs<'_>) -> PixelMathResult<Raster>;

/// Extra argument checks run during validation.
pub type ValidateFn = fn(&[Expr]) -> Result<(), String>;

/// Assignment operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `^=`
    Pow,
    /// `%=`
    Mod,
    /// `--=`
    Dif,
    /// `&&=`
    And,
    /// `||=`
    Or,
}

impl AssignOp {
    /// Combine the current value `a` with the assigned value `b`.
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            AssignOp::Set => b,
            AssignOp::Add => a + b,
            AssignOp::Sub => a - b,
            AssignOp::Mul => a * b,
            AssignOp::Div => a / b,
            AssignOp::Pow => a.powf(b),
            AssignOp::Mod => a % b,
            AssignOp::Dif => (a - b).abs(),
            AssignOp::And => f64::from(u8::from(a != 0.0 && b != 0.0)),
            AssignOp::Or => f64::from(u8::from(a != 0.0 || b != 0.0)),
        }
    }
}

/// Syntactic role of a registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    /// Unary or binary operator.
    Operator,
    /// Named function.
    Function,
    /// Assignment operator; the first argument must be a variable.
    Assignment(AssignOp),
}

/// When a call can be evaluated once at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invariance {
    /// When every argument is a literal.
    Pure,
    /// Never: depends on position, is stochastic or has side effects.
    Never,
    /// When given a single whole-image reference, or when every argument is a literal.
    ImageStatistics,
    /// When the image is bound and every other argument is a literal.
    PixelLookup,
}

/// Short-circuit shape emitted as branches by the optimizing compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// `iif(c, a, b)`
    Iif,
    /// `iswitch(c1, v1, ..., default)`
    Iswitch,
    /// `a && b`
    And,
    /// `a || b`
    Or,
}

/// A built-in function or operator.
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Canonical name.
    pub token: &'static str,
    /// Alternative names and operator symbols.
    pub aliases: &'static [&'static str],
    /// Minimum argument count.
    pub min_args: u8,
    /// Maximum argument count; `None` for variadic functions.
    pub max_args: Option<u8>,
    /// Syntactic role.
    pub kind: FunctionKind,
    /// Compile-time folding rule.
    pub invariance: Invariance,
    /// Per-pixel evaluation.
    pub eval: EvalFn,
    /// Image synthesis, for image generators.
    pub generate: Option<GenerateFn>,
    /// Short-circuit shape.
    pub control: Option<Control>,
    /// Extra argument checks.
    pub validate: Option<ValidateFn>,
    /// The first argument must be an image and is passed by reference.
    pub image_argument: bool,
    /// One-line description.
    pub summary: &'static str,
}

impl FunctionDef {
    pub(crate) const fn function(
        token: &'static str,
        min_args: u8,
        max_args: Option<u8>,
        eval: EvalFn,
        summary: &'static str,
    ) -> Self {
        Self {
            token,
            aliases: &[],
            min_args,
            max_args,
            kind: FunctionKind::Function,
            invariance: Invariance::Pure,
            eval,
            generate: None,
            control: None,
            validate: None,
            image_argument: false,
            summary,
        }
    }

    pub(crate) const fn operator(
        token: &'static str,
        symbols: &'static [&'static str],
        argc: u8,
        eval: EvalFn,
        summary: &'static str,
    ) -> Self {
        let mut def = Self::function(token, argc, Some(argc), eval, summary);
        def.aliases = symbols;
        def.kind = FunctionKind::Operator;
        def
    }

    pub(crate) const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub(crate) const fn invariance(mut self, invariance: Invariance) -> Self {
        self.invariance = invariance;
        self
    }

    pub(crate) const fn control(mut self, control: Control) -> Self {
        self.control = Some(control);
        self
    }

    pub(crate) const fn assignment(mut self, op: AssignOp) -> Self {
        self.kind = FunctionKind::Assignment(op);
        self.invariance = Invariance::Never;
        self
    }

    pub(crate) const fn generator(mut self, generate: GenerateFn) -> Self {
        self.generate = Some(generate);
        self.invariance = Invariance::Never;
        self.image_argument = true;
        self
    }

    pub(crate) const fn validated(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub(crate) const fn image_argument(mut self) -> Self {
        self.image_argument = true;
        self
    }

    /// `true` when `argc` arguments are accepted.
    pub fn accepts(&self, argc: usize) -> bool {
        argc >= usize::from(self.min_args)
            && self.max_args.is_none_or(|max| argc <= usize::from(max))
    }

    /// Human-readable arity, e.g. `2`, `1..3` or `1..`.
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{max}", self.min_args),
            None => format!("{}..", self.min_args),
        }
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("token", &self.token)
            .field("aliases", &self.aliases)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("kind", &self.kind)
            .field("invariance", &self.invariance)
            .field("generator", &self.generate.is_some())
            .field("control", &self.control)
            .finish()
    }
}

struct Registry {
    defs: Vec<&'static FunctionDef>,
    index: Vec<(&'static str, FunctionId)>,
}

impl Registry {
    fn build() -> Self {
        let mut defs = Vec::new();
        let mut index = Vec::new();
        for table in builtins::TABLES {
            for def in table.iter() {
                let id = FunctionId(defs.len() as u16);
                defs.push(def);
                index.push((def.token, id));
                index.extend(def.aliases.iter().map(|a| (*a, id)));
            }
        }
        index.sort_by(|a, b| a.0.cmp(b.0));
        debug_assert!(
            index.windows(2).all(|w| w[0].0 != w[1].0),
            "function names must be unique"
        );
        Self { defs, index }
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::build);

/// Stable index of a registry entry. Serializes as the function's token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionId(u16);

impl FunctionId {
    /// Find a function by token or alias.
    pub fn lookup(name: &str) -> Option<Self> {
        let index = &REGISTRY.index;
        index
            .binary_search_by(|(n, _)| (*n).cmp(name))
            .ok()
            .map(|i| index[i].1)
    }

    /// Like [`FunctionId::lookup`], reporting unknown names as compile errors.
    pub fn named(name: &str) -> PixelMathResult<Self> {
        Self::lookup(name)
            .ok_or_else(|| PixelMathError::compile(format!("unknown function '{name}'")))
    }

    /// Registry entry.
    pub fn def(self) -> &'static FunctionDef {
        REGISTRY.defs[usize::from(self.0)]
    }

    /// Canonical name.
    pub fn token(self) -> &'static str {
        self.def().token
    }
}

impl fmt::Debug for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionId({})", self.token())
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl TryFrom<String> for FunctionId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::lookup(&name).ok_or_else(|| format!("unknown function '{name}'"))
    }
}

impl From<FunctionId> for String {
    fn from(id: FunctionId) -> Self {
        id.token().to_string()
    }
}

/// Every registered function, in registration order.
pub fn functions() -> impl Iterator<Item = (FunctionId, &'static FunctionDef)> {
    REGISTRY
        .defs
        .iter()
        .enumerate()
        .map(|(i, def)| (FunctionId(i as u16), *def))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/registry.rs"]
mod tests;
