/// Host-neutral physical key identifier.
///
/// Frontends translate their native keycodes into this enum so the input
/// forwarder never has to know about SDL or the DOM.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Key {
    Num1,
    Num2,
    Num3,
    Num4,
    Q,
    W,
    E,
    R,
    A,
    S,
    D,
    F,
    Z,
    X,
    C,
    V,
    Escape,
    None,
}
