// Public debug macros

/// Print expressions with their source text through the global [`lit()`]
/// printer and hand the values back.
///
/// * `lit!()` prints the call context and a timestamp, returns `()`
/// * `lit!(x)` returns `x`
/// * `lit!(a, b)` returns `(a, b)`
///
/// When the calling source can't be read back (a stripped binary, a file
/// moved after build) values print without labels and a warning is sent
/// through the `log` facade. It is only visible with a logger installed,
/// e.g. `env_logger::init()` and `RUST_LOG=warn`.
///
/// [`lit()`]: crate::lit()
#[macro_export]
macro_rules! lit {
    ($($arg:tt)*) => {
        $crate::lit_with!($crate::lit(); $($arg)*)
    };
}

/// Same as [`lit!`] through the context-free [`litprint()`] printer
///
/// [`litprint()`]: crate::litprint()
#[macro_export]
macro_rules! litprint {
    ($($arg:tt)*) => {
        $crate::lit_with!($crate::litprint(); $($arg)*)
    };
}

/// [`lit!`] against an explicit [`Debugger`](crate::Debugger)
#[macro_export]
macro_rules! lit_with {
    ($debugger:expr;) => {{
        let __debugger: &$crate::Debugger = &$debugger;
        __debugger.emit(&$crate::__frame!(), ::std::vec::Vec::new());
    }};
    ($debugger:expr; $value:expr $(,)?) => {{
        let __debugger: &$crate::Debugger = &$debugger;
        let __v = $value;
        if __debugger.is_enabled() {
            __debugger.emit(
                &$crate::__frame!(),
                ::std::vec![$crate::__value!(&__v)],
            );
        }
        __v
    }};
    ($debugger:expr; $($value:expr),+ $(,)?) => {{
        let __debugger: &$crate::Debugger = &$debugger;
        let __on = __debugger.is_enabled();
        let mut __values = ::std::vec::Vec::new();
        let __result = ($({
            let __v = $value;
            if __on {
                __values.push($crate::__value!(&__v));
            }
            __v
        },)+);
        if __on {
            __debugger.emit(&$crate::__frame!(), __values);
        }
        __result
    }};
}

/// Format like [`lit!`] without printing; always formats, even when the
/// printer is disabled
#[macro_export]
macro_rules! lit_format {
    ($($value:expr),* $(,)?) => {
        $crate::lit().format(
            &$crate::__frame!(),
            ::std::vec![$($crate::__value!(&$value)),*],
        )
    };
}

/// Remember variables for the panic report on this thread
#[macro_export]
macro_rules! lit_track {
    ($($value:expr),+ $(,)?) => {
        $(
            $crate::traceback::track(::std::stringify!($value), $crate::__value!(&$value));
        )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __frame {
    () => {
        $crate::Frame {
            file: ::std::file!(),
            line: ::std::line!(),
            column: ::std::column!(),
            module_path: ::std::module_path!(),
            function: $crate::__private::function_name({
                fn __f() {}
                ::std::any::type_name_of_val(&__f)
            }),
            manifest_dir: ::std::option_env!("CARGO_MANIFEST_DIR"),
        }
    };
}

/// `Inspect` when implemented, then `Error`, then `Debug`
#[doc(hidden)]
#[macro_export]
macro_rules! __value {
    ($value:expr) => {{
        #[allow(unused_imports)]
        use $crate::__private::{ViaDebug as _, ViaError as _, ViaInspect as _};
        (&&$crate::__private::Wrap($value)).__lit_value()
    }};
}
