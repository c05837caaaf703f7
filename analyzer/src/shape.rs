// shape.rs — Logical shapes of computation values
//
// A shape is either an array (element type + dimension sizes, optionally a
// physical layout) or a tuple of nested shapes. Analyses only care about the
// logical part; layouts are carried so they can be stripped explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Element types ───────────────────────────────────────────────────────────

/// Element type of an array shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Pred,
    S8,
    S16,
    S32,
    S64,
    U8,
    U16,
    U32,
    U64,
    F16,
    Bf16,
    F32,
    F64,
    C64,
    C128,
    Token,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Pred => "pred",
            PrimitiveType::S8 => "s8",
            PrimitiveType::S16 => "s16",
            PrimitiveType::S32 => "s32",
            PrimitiveType::S64 => "s64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F16 => "f16",
            PrimitiveType::Bf16 => "bf16",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::C64 => "c64",
            PrimitiveType::C128 => "c128",
            PrimitiveType::Token => "token",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Layout ──────────────────────────────────────────────────────────────────

/// Physical dimension ordering of an array, most-minor dimension first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub minor_to_major: Vec<usize>,
}

impl Layout {
    pub fn new(minor_to_major: Vec<usize>) -> Self {
        Self { minor_to_major }
    }

    /// Row-major layout for an array of the given rank (`{rank-1, ..., 0}`).
    pub fn row_major(rank: usize) -> Self {
        Self {
            minor_to_major: (0..rank).rev().collect(),
        }
    }
}

// ── Shape ───────────────────────────────────────────────────────────────────

/// Recursive shape value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Array {
        element_type: PrimitiveType,
        dimensions: Vec<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layout: Option<Layout>,
    },
    Tuple { elements: Vec<Shape> },
}

impl Shape {
    /// Array shape without a layout.
    pub fn array(element_type: PrimitiveType, dimensions: Vec<u64>) -> Self {
        Shape::Array {
            element_type,
            dimensions,
            layout: None,
        }
    }

    /// Rank-0 array shape.
    pub fn scalar(element_type: PrimitiveType) -> Self {
        Shape::array(element_type, Vec::new())
    }

    pub fn tuple(elements: Vec<Shape>) -> Self {
        Shape::Tuple { elements }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Shape::Tuple { .. })
    }

    /// Number of dimensions of an array shape; `None` for tuples.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Shape::Array { dimensions, .. } => Some(dimensions.len()),
            Shape::Tuple { .. } => None,
        }
    }

    /// Element shapes of a tuple; `None` for arrays.
    pub fn tuple_shapes(&self) -> Option<&[Shape]> {
        match self {
            Shape::Tuple { elements } => Some(elements),
            Shape::Array { .. } => None,
        }
    }

    /// Attach a layout to an array shape. Tuples are returned unchanged.
    pub fn with_layout(self, new_layout: Layout) -> Self {
        match self {
            Shape::Array {
                element_type,
                dimensions,
                ..
            } => Shape::Array {
                element_type,
                dimensions,
                layout: Some(new_layout),
            },
            tuple @ Shape::Tuple { .. } => tuple,
        }
    }

    /// True if this shape or any nested shape carries a layout.
    pub fn has_layout(&self) -> bool {
        match self {
            Shape::Array { layout, .. } => layout.is_some(),
            Shape::Tuple { elements } => elements.iter().any(Shape::has_layout),
        }
    }

    /// Remove layout metadata from this shape and every nested shape.
    pub fn clear_layout(&mut self) {
        match self {
            Shape::Array { layout, .. } => *layout = None,
            Shape::Tuple { elements } => elements.iter_mut().for_each(Shape::clear_layout),
        }
    }

    pub fn without_layout(mut self) -> Self {
        self.clear_layout();
        self
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Array {
                element_type,
                dimensions,
                layout,
            } => {
                write!(f, "{}[", element_type)?;
                write_joined(f, dimensions, ",")?;
                f.write_str("]")?;
                if let Some(layout) = layout {
                    f.write_str("{")?;
                    write_joined(f, &layout.minor_to_major, ",")?;
                    f.write_str("}")?;
                }
                Ok(())
            }
            Shape::Tuple { elements } => {
                f.write_str("(")?;
                write_joined(f, elements, ", ")?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_array_and_tuple() {
        let a = Shape::array(PrimitiveType::F32, vec![8, 4]);
        assert_eq!(a.to_string(), "f32[8,4]");
        let t = Shape::tuple(vec![a.clone(), Shape::scalar(PrimitiveType::S32)]);
        assert_eq!(t.to_string(), "(f32[8,4], s32[])");
        let with_layout = a.with_layout(Layout::row_major(2));
        assert_eq!(with_layout.to_string(), "f32[8,4]{1,0}");
    }

    #[test]
    fn clear_layout_is_recursive() {
        let inner = Shape::array(PrimitiveType::Bf16, vec![2, 3]).with_layout(Layout::new(vec![0, 1]));
        let mut nested = Shape::tuple(vec![
            Shape::tuple(vec![inner]),
            Shape::scalar(PrimitiveType::Pred),
        ]);
        assert!(nested.has_layout());
        nested.clear_layout();
        assert!(!nested.has_layout());
        assert_eq!(nested.to_string(), "((bf16[2,3]), pred[])");
    }

    #[test]
    fn rank_and_tuple_accessors() {
        let a = Shape::array(PrimitiveType::U8, vec![1, 2, 3]);
        assert_eq!(a.rank(), Some(3));
        assert!(a.tuple_shapes().is_none());
        let t = Shape::tuple(Vec::new());
        assert_eq!(t.rank(), None);
        assert_eq!(t.tuple_shapes().map(<[Shape]>::len), Some(0));
        assert_eq!(t.to_string(), "()");
    }

    #[test]
    fn json_form() {
        let s: Shape = serde_json::from_str(
            r#"{"kind":"tuple","elements":[{"kind":"array","element_type":"f32","dimensions":[8,4],"layout":{"minor_to_major":[1,0]}}]}"#,
        )
        .unwrap();
        let element = Shape::array(PrimitiveType::F32, vec![8, 4]).with_layout(Layout::row_major(2));
        assert_eq!(s, Shape::tuple(vec![element]));
        let out = serde_json::to_string(&Shape::scalar(PrimitiveType::S64)).unwrap();
        assert_eq!(
            out,
            r#"{"kind":"array","element_type":"s64","dimensions":[]}"#
        );
    }
}
