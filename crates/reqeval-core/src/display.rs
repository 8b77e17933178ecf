//! Compact rendering of request inputs for diagnostics and tracing.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Render a value the way it should appear inside a request's display form.
///
/// Display output is never used for equality or hashing.
pub trait SimpleDisplay {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Adapter that implements [`fmt::Display`] through [`SimpleDisplay`]
pub struct Displayed<'a, T: ?Sized>(pub &'a T);

impl<T: SimpleDisplay + ?Sized> fmt::Display for Displayed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.simple_display(f)
    }
}

pub fn display_string<T: SimpleDisplay + ?Sized>(value: &T) -> String {
    Displayed(value).to_string()
}

macro_rules! display_via {
    ($fmt:literal => $($ty:ty),* $(,)?) => {
        $(
            impl SimpleDisplay for $ty {
                fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, $fmt, self)
                }
            }
        )*
    };
}

display_via!("{}" => u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, bool);
// Floats keep their fractional part so `3.0` does not render as `3`
display_via!("{:?}" => f32, f64, char, str, String);

impl SimpleDisplay for () {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("()")
    }
}

impl<T: SimpleDisplay> SimpleDisplay for Option<T> {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Some(value) => value.simple_display(f),
            None => f.write_str("none"),
        }
    }
}

impl<T: SimpleDisplay> SimpleDisplay for [T] {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            value.simple_display(f)?;
        }
        f.write_str("}")
    }
}

impl<T: SimpleDisplay> SimpleDisplay for Vec<T> {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().simple_display(f)
    }
}

impl<T: SimpleDisplay + ?Sized> SimpleDisplay for &T {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).simple_display(f)
    }
}

impl<T: SimpleDisplay + ?Sized> SimpleDisplay for Box<T> {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).simple_display(f)
    }
}

impl<T: SimpleDisplay + ?Sized> SimpleDisplay for Rc<T> {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).simple_display(f)
    }
}

impl<T: SimpleDisplay + ?Sized> SimpleDisplay for Arc<T> {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).simple_display(f)
    }
}

macro_rules! tuple_display {
    ($( ($head:ident : $head_idx:tt $(, $name:ident : $idx:tt)*) ),* $(,)?) => {
        $(
            impl<$head: SimpleDisplay $(, $name: SimpleDisplay)*> SimpleDisplay
                for ($head, $($name,)*)
            {
                fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("(")?;
                    self.$head_idx.simple_display(f)?;
                    $(
                        f.write_str(", ")?;
                        self.$idx.simple_display(f)?;
                    )*
                    f.write_str(")")
                }
            }
        )*
    };
}

tuple_display! {
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5),
}
