//=========================================================================
// Key Identifiers
//
// Physical keyboard keys and modifier state.
//
// `Key` discriminants are the USB-HID usage ids, which is also the
// published SDL scancode table. Gaps in the numbering (e.g. 130-132,
// 165-175) are gaps in that table and are kept as-is so a scancode can be
// converted with a plain cast.
//
//=========================================================================

//=== Key Table ===========================================================

/// Defines `Key` together with its scancode lookup and name table so the
/// three can never drift apart.
macro_rules! key_table {
    ($($name:ident = $code:literal,)+) => {
        /// Physical keyboard key, identified by scancode.
        ///
        /// Represents the key location, not the character produced:
        /// `KeyA` is the same physical key on QWERTY and AZERTY layouts.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Key {
            /// Scancode 0, or any code not present in the table.
            Unidentified = 0,
            $($name = $code,)+
        }

        impl Key {
            /// Every named key, in scancode order.
            pub const ALL: &'static [Key] = &[$(Key::$name,)+];

            /// Looks up a key by scancode. Unknown codes map to
            /// [`Key::Unidentified`].
            pub fn from_scancode(code: u16) -> Key {
                match code {
                    $($code => Key::$name,)+
                    _ => Key::Unidentified,
                }
            }

            /// Human-readable key name.
            pub fn name(self) -> &'static str {
                match self {
                    Key::Unidentified => "Unidentified",
                    $(Key::$name => stringify!($name),)+
                }
            }
        }
    };
}

key_table! {
    KeyA = 4, KeyB = 5, KeyC = 6, KeyD = 7, KeyE = 8, KeyF = 9,
    KeyG = 10, KeyH = 11, KeyI = 12, KeyJ = 13, KeyK = 14, KeyL = 15,
    KeyM = 16, KeyN = 17, KeyO = 18, KeyP = 19, KeyQ = 20, KeyR = 21,
    KeyS = 22, KeyT = 23, KeyU = 24, KeyV = 25, KeyW = 26, KeyX = 27,
    KeyY = 28, KeyZ = 29,

    Digit1 = 30, Digit2 = 31, Digit3 = 32, Digit4 = 33, Digit5 = 34,
    Digit6 = 35, Digit7 = 36, Digit8 = 37, Digit9 = 38, Digit0 = 39,

    Enter = 40,
    Escape = 41,
    Backspace = 42,
    Tab = 43,
    Space = 44,
    Minus = 45,
    Equal = 46,
    BracketLeft = 47,
    BracketRight = 48,
    Backslash = 49,
    NonUsHash = 50,
    Semicolon = 51,
    Quote = 52,
    Backquote = 53,
    Comma = 54,
    Period = 55,
    Slash = 56,
    CapsLock = 57,

    F1 = 58, F2 = 59, F3 = 60, F4 = 61, F5 = 62, F6 = 63,
    F7 = 64, F8 = 65, F9 = 66, F10 = 67, F11 = 68, F12 = 69,

    PrintScreen = 70,
    ScrollLock = 71,
    Pause = 72,
    Insert = 73,
    Home = 74,
    PageUp = 75,
    Delete = 76,
    End = 77,
    PageDown = 78,
    ArrowRight = 79,
    ArrowLeft = 80,
    ArrowDown = 81,
    ArrowUp = 82,

    NumLockClear = 83,
    NumpadDivide = 84,
    NumpadMultiply = 85,
    NumpadSubtract = 86,
    NumpadAdd = 87,
    NumpadEnter = 88,
    Numpad1 = 89, Numpad2 = 90, Numpad3 = 91, Numpad4 = 92, Numpad5 = 93,
    Numpad6 = 94, Numpad7 = 95, Numpad8 = 96, Numpad9 = 97, Numpad0 = 98,
    NumpadDecimal = 99,

    NonUsBackslash = 100,
    Application = 101,
    Power = 102,
    NumpadEqual = 103,

    F13 = 104, F14 = 105, F15 = 106, F16 = 107, F17 = 108, F18 = 109,
    F19 = 110, F20 = 111, F21 = 112, F22 = 113, F23 = 114, F24 = 115,

    Execute = 116,
    Help = 117,
    Menu = 118,
    Select = 119,
    Stop = 120,
    Again = 121,
    Undo = 122,
    Cut = 123,
    Copy = 124,
    Paste = 125,
    Find = 126,
    Mute = 127,
    VolumeUp = 128,
    VolumeDown = 129,

    NumpadComma = 133,
    NumpadEqualAs400 = 134,

    International1 = 135, International2 = 136, International3 = 137,
    International4 = 138, International5 = 139, International6 = 140,
    International7 = 141, International8 = 142, International9 = 143,

    Lang1 = 144, Lang2 = 145, Lang3 = 146, Lang4 = 147, Lang5 = 148,
    Lang6 = 149, Lang7 = 150, Lang8 = 151, Lang9 = 152,

    AltErase = 153,
    SysReq = 154,
    Cancel = 155,
    Clear = 156,
    Prior = 157,
    Return2 = 158,
    Separator = 159,
    Out = 160,
    Oper = 161,
    ClearAgain = 162,
    CrSel = 163,
    ExSel = 164,

    Numpad00 = 176,
    Numpad000 = 177,
    ThousandsSeparator = 178,
    DecimalSeparator = 179,
    CurrencyUnit = 180,
    CurrencySubunit = 181,
    NumpadParenLeft = 182,
    NumpadParenRight = 183,
    NumpadBraceLeft = 184,
    NumpadBraceRight = 185,
    NumpadTab = 186,
    NumpadBackspace = 187,
    NumpadA = 188, NumpadB = 189, NumpadC = 190,
    NumpadD = 191, NumpadE = 192, NumpadF = 193,
    NumpadXor = 194,
    NumpadPower = 195,
    NumpadPercent = 196,
    NumpadLess = 197,
    NumpadGreater = 198,
    NumpadAmpersand = 199,
    NumpadDoubleAmpersand = 200,
    NumpadVerticalBar = 201,
    NumpadDoubleVerticalBar = 202,
    NumpadColon = 203,
    NumpadHash = 204,
    NumpadSpace = 205,
    NumpadAt = 206,
    NumpadExclam = 207,
    NumpadMemStore = 208,
    NumpadMemRecall = 209,
    NumpadMemClear = 210,
    NumpadMemAdd = 211,
    NumpadMemSubtract = 212,
    NumpadMemMultiply = 213,
    NumpadMemDivide = 214,
    NumpadPlusMinus = 215,
    NumpadClear = 216,
    NumpadClearEntry = 217,
    NumpadBinary = 218,
    NumpadOctal = 219,
    NumpadDecimalMode = 220,
    NumpadHexadecimal = 221,

    ControlLeft = 224,
    ShiftLeft = 225,
    AltLeft = 226,
    SuperLeft = 227,
    ControlRight = 228,
    ShiftRight = 229,
    AltRight = 230,
    SuperRight = 231,

    Mode = 257,
    AudioNext = 258,
    AudioPrev = 259,
    AudioStop = 260,
    AudioPlay = 261,
    AudioMute = 262,
    MediaSelect = 263,
    Www = 264,
    Mail = 265,
    Calculator = 266,
    Computer = 267,
    AcSearch = 268,
    AcHome = 269,
    AcBack = 270,
    AcForward = 271,
    AcStop = 272,
    AcRefresh = 273,
    AcBookmarks = 274,
    BrightnessDown = 275,
    BrightnessUp = 276,
    DisplaySwitch = 277,
    KbdIllumToggle = 278,
    KbdIllumDown = 279,
    KbdIllumUp = 280,
    Eject = 281,
    Sleep = 282,
    App1 = 283,
    App2 = 284,
    AudioRewind = 285,
    AudioFastForward = 286,
    SoftLeft = 287,
    SoftRight = 288,
    Call = 289,
    EndCall = 290,
}

/// Size of a platform key-state array: one entry per possible scancode.
pub const KEY_STATE_LEN: usize = 512;

impl Key {
    /// The raw scancode (index into the key-state array).
    pub fn scancode(self) -> u16 {
        self as u16
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

//=== Modifiers ===========================================================

/// Modifier key state (Shift, Ctrl, Alt, Meta).
///
/// Left and right variants are not distinguished. Modifiers must match
/// exactly when compared: `CTRL` is not equal to `SHIFT_CTRL`.
///
/// # Platform Mapping
///
/// - **Shift**: Left Shift OR Right Shift
/// - **Ctrl**: Left Ctrl OR Right Ctrl
/// - **Alt**: Left Alt OR Right Alt (Option on macOS)
/// - **Meta**: Windows / Command / Super key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

//--- Modifier Constants --------------------------------------------------

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const SHIFT_CTRL: Self = Self {
        shift: true,
        ctrl: true,
        ..Self::NONE
    };

    pub const CTRL_ALT: Self = Self {
        ctrl: true,
        alt: true,
        ..Self::NONE
    };

    /// Returns `true` if no modifier is held.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// Union of two modifier sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            meta: self.meta || other.meta,
        }
    }
}

//--- Trait Implementations -----------------------------------------------

impl Default for Modifiers {
    /// Defaults to no modifiers held.
    fn default() -> Self {
        Self::NONE
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
