use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

/// A key that can be routed to a shard.
///
/// Every key is reduced to a canonical string before hashing. Strings pass
/// through untouched and integers of any width render in base 10, so `42u8`,
/// `42i64` and `"42"` land in the same shard *and* address the same entry.
///
/// Only the types below implement this trait. Anything else is rejected at
/// compile time rather than at the call site.
pub trait ShardKey {
    /// The canonical encoding used for hashing and key equality.
    fn canonical(&self) -> Cow<'_, str>;
}

impl ShardKey for str {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ShardKey for String {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl ShardKey for Box<str> {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ShardKey for Arc<str> {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ShardKey for Rc<str> {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ShardKey for Cow<'_, str> {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_ref())
    }
}

impl<T: ShardKey + ?Sized> ShardKey for &T {
    #[inline]
    fn canonical(&self) -> Cow<'_, str> {
        (**self).canonical()
    }
}

macro_rules! integer_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShardKey for $ty {
                #[inline]
                fn canonical(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

integer_keys!(i8, i16, i32, i64, i128, isize);
integer_keys!(u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_pass_through() {
        assert_eq!("hello".canonical(), "hello");
        assert_eq!(String::from("hello").canonical(), "hello");
        assert_eq!(Arc::<str>::from("a b").canonical(), "a b");
        assert_eq!(Box::<str>::from("").canonical(), "");
        assert!(matches!("borrowed".canonical(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_signed_integers() {
        assert_eq!(42i32.canonical(), "42");
        assert_eq!((-7i8).canonical(), "-7");
        assert_eq!(0i64.canonical(), "0");
        assert_eq!(i128::MIN.canonical(), i128::MIN.to_string());
        assert_eq!((-1isize).canonical(), "-1");
    }

    #[test]
    fn test_unsigned_integers() {
        assert_eq!(42u8.canonical(), "42");
        assert_eq!(u64::MAX.canonical(), "18446744073709551615");
        assert_eq!(7usize.canonical(), "7");
    }

    #[test]
    fn test_widths_agree() {
        let expected = "100";
        assert_eq!(100u8.canonical(), expected);
        assert_eq!(100i16.canonical(), expected);
        assert_eq!(100u128.canonical(), expected);
        assert_eq!((&100usize).canonical(), expected);
    }
}
