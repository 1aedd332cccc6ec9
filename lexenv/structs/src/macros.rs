/// Builds [`Bindings`](crate::frame::Bindings) from `name => value` pairs.
/// Values go through `Value::from`.
/// ```
/// use lexenv_structs::bindings;
/// let seed = bindings! {"count" => 0, "label" => "counter"};
/// assert_eq!(seed.len(), 2);
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::frame::Bindings::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut bindings = $crate::frame::Bindings::new();
        $(
            bindings.insert($name.to_string(), $crate::value::Value::from($value));
        )+
        bindings
    }};
}
