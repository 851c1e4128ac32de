use crate::expression::registry::FunctionId;
use crate::foundation::error::PixelMathResult;
use crate::foundation::pixel::Pixel;

/// Identifier of the execution target image.
pub const TARGET_IMAGE: &str = "$T";

/// Named image operand.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    /// Image identifier, or `$T` / `$target` for the target image.
    pub id: String,
    /// Channel to read as a gray value; the whole pixel when `None`.
    #[serde(default)]
    pub channel: Option<usize>,
    /// Pass the image itself to the consuming function instead of a pixel snapshot.
    #[serde(default)]
    pub by_reference: bool,
}

/// Named variable operand.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarRef {
    /// Variable identifier.
    pub name: String,
    /// Channel to read or assign; the whole value when `None`.
    #[serde(default)]
    pub channel: Option<usize>,
}

/// Function or operator call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Call {
    /// Function identity.
    pub func: FunctionId,
    /// Arguments, in evaluation order.
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// Expression tree node.
///
/// Trees are produced by callers (or deserialized from JSON) and are checked by
/// validation before compilation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Immediate scalar.
    Sample(f64),
    /// Immediate gray or RGB literal.
    Pixel(Pixel),
    /// Image operand.
    Image(ImageRef),
    /// Mutable variable.
    Variable(VarRef),
    /// Named constant.
    Constant(String),
    /// Function call.
    Call(Call),
}

impl Expr {
    /// Scalar literal.
    pub fn sample(v: f64) -> Self {
        Expr::Sample(v)
    }

    /// RGB literal.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Expr::Pixel(Pixel::rgb(r, g, b))
    }

    /// Whole-pixel image operand.
    pub fn image(id: impl Into<String>) -> Self {
        Expr::Image(ImageRef {
            id: id.into(),
            channel: None,
            by_reference: false,
        })
    }

    /// Single-channel image operand.
    pub fn image_channel(id: impl Into<String>, channel: usize) -> Self {
        Expr::Image(ImageRef {
            id: id.into(),
            channel: Some(channel),
            by_reference: false,
        })
    }

    /// The target image.
    pub fn target() -> Self {
        Self::image(TARGET_IMAGE)
    }

    /// Variable operand.
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(VarRef {
            name: name.into(),
            channel: None,
        })
    }

    /// Constant operand.
    pub fn constant(name: impl Into<String>) -> Self {
        Expr::Constant(name.into())
    }

    /// Call the function registered under `name` (token or alias).
    pub fn call(name: &str, args: Vec<Expr>) -> PixelMathResult<Self> {
        Ok(Expr::Call(Call {
            func: FunctionId::named(name)?,
            args,
        }))
    }

    /// `true` for `Sample` and `Pixel` nodes.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Sample(_) | Expr::Pixel(_))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Sample(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/node.rs"]
mod tests;
