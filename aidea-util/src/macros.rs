#[macro_export]
macro_rules! assert_matches {
    ($expr:expr => $pat:pat) => {
        match $expr {
            $pat => {}
            ref actual => panic!(
                "assertion failed: `{:?}` does not match `{}`",
                actual,
                stringify!($pat)
            ),
        }
    };
    ($expr:expr => $pat:pat,) => {
        $crate::assert_matches!($expr => $pat)
    };
}
