pub use enclose::*;

#[macro_export]
macro_rules! watch {
    (( $($d_tt:tt)* ) $watcher:expr, $source:expr, $pred:expr, $next:ident => $($b:tt)*) => {
        $watcher.watch_request($source, $pred, $crate::macros::enclose!(($( $d_tt )*) move |$next| { $($b)* }))
    };
    ($watcher:expr, $source:expr, $pred:expr, $next:ident => $($b:tt)*) => {
        $watcher.watch_request($source, $pred, move |$next| { $($b)* })
    };
}
