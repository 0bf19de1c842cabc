/// Declares function pointer types for C++ virtual methods.
///
/// MSVC passes `this` in ECX for member functions on x86 (`thiscall`). On
/// x86-64 there is a single convention and `this` is simply the first
/// argument, so the plain C ABI matches.
macro_rules! virtual_fn {
    ($($(#[$meta:meta])* $vis:vis type $name:ident = fn($($arg:ty),* $(,)?) $(-> $ret:ty)?;)*) => {
        $(
            $(#[$meta])*
            #[cfg(target_arch = "x86")]
            $vis type $name = unsafe extern "thiscall" fn($($arg),*) $(-> $ret)?;

            $(#[$meta])*
            #[cfg(not(target_arch = "x86"))]
            $vis type $name = unsafe extern "C" fn($($arg),*) $(-> $ret)?;
        )*
    };
}
