//! Stable key names crossing the recording-file boundary
//!
//! Recorded keys are stored by name so a recording made on one session
//! replays on another. Unknown keys survive the round trip as opaque
//! names and replay as a logged no-op.

/// Name under which a global key event is recorded.
pub fn rdev_key_name(key: &rdev::Key) -> String {
    use rdev::Key::*;
    let name = match key {
        KeyA => "a",
        KeyB => "b",
        KeyC => "c",
        KeyD => "d",
        KeyE => "e",
        KeyF => "f",
        KeyG => "g",
        KeyH => "h",
        KeyI => "i",
        KeyJ => "j",
        KeyK => "k",
        KeyL => "l",
        KeyM => "m",
        KeyN => "n",
        KeyO => "o",
        KeyP => "p",
        KeyQ => "q",
        KeyR => "r",
        KeyS => "s",
        KeyT => "t",
        KeyU => "u",
        KeyV => "v",
        KeyW => "w",
        KeyX => "x",
        KeyY => "y",
        KeyZ => "z",
        Num0 => "0",
        Num1 => "1",
        Num2 => "2",
        Num3 => "3",
        Num4 => "4",
        Num5 => "5",
        Num6 => "6",
        Num7 => "7",
        Num8 => "8",
        Num9 => "9",
        F1 => "f1",
        F2 => "f2",
        F3 => "f3",
        F4 => "f4",
        F5 => "f5",
        F6 => "f6",
        F7 => "f7",
        F8 => "f8",
        F9 => "f9",
        F10 => "f10",
        F11 => "f11",
        F12 => "f12",
        Return => "enter",
        Space => "space",
        Tab => "tab",
        Escape => "esc",
        Backspace => "backspace",
        Delete => "delete",
        Insert => "insert",
        Home => "home",
        End => "end",
        PageUp => "pageup",
        PageDown => "pagedown",
        UpArrow => "up",
        DownArrow => "down",
        LeftArrow => "left",
        RightArrow => "right",
        ShiftLeft | ShiftRight => "shift",
        ControlLeft | ControlRight => "ctrl",
        Alt => "alt",
        AltGr => "altgr",
        MetaLeft | MetaRight => "meta",
        CapsLock => "capslock",
        Minus => "-",
        Equal => "=",
        Comma => ",",
        Dot => ".",
        Slash => "/",
        SemiColon => ";",
        Quote => "'",
        BackQuote => "`",
        LeftBracket => "[",
        RightBracket => "]",
        BackSlash => "\\",
        KpReturn => "enter",
        Unknown(code) => return format!("unknown-{code}"),
        other => return format!("{other:?}").to_lowercase(),
    };
    name.to_string()
}

/// Resolve a recorded key name to an injectable key.
pub fn to_enigo_key(name: &str) -> Option<enigo::Key> {
    use enigo::Key;
    let key = match name {
        "enter" => Key::Return,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "shift" => Key::Shift,
        "ctrl" => Key::Control,
        "alt" => Key::Alt,
        "meta" => Key::Meta,
        "capslock" => Key::CapsLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            let (first, rest) = (chars.next()?, chars.next());
            if rest.is_none() {
                Key::Unicode(first)
            } else {
                return None;
            }
        }
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_keys_round_trip() {
        assert_eq!(rdev_key_name(&rdev::Key::KeyA), "a");
        assert_eq!(to_enigo_key("a"), Some(enigo::Key::Unicode('a')));
    }

    #[test]
    fn test_named_keys_round_trip() {
        assert_eq!(rdev_key_name(&rdev::Key::Return), "enter");
        assert_eq!(to_enigo_key("enter"), Some(enigo::Key::Return));
        assert_eq!(rdev_key_name(&rdev::Key::F8), "f8");
        assert_eq!(to_enigo_key("f8"), Some(enigo::Key::F8));
    }

    #[test]
    fn test_unknown_keys_are_named_but_not_injectable() {
        let name = rdev_key_name(&rdev::Key::Unknown(1234));
        assert_eq!(name, "unknown-1234");
        assert_eq!(to_enigo_key(&name), None);
    }
}
