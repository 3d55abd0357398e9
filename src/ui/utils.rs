use ratatui::style::Color;

pub const BACKGROUND: Color = Color::Rgb(0x18, 0x18, 0x18);
pub const ACCENT: Color = Color::Rgb(0xf7, 0xd4, 0x4b);
pub const MUTED: Color = Color::Rgb(0x46, 0x46, 0x46);
pub const TEXT: Color = Color::Rgb(0xd0, 0xd0, 0xd0);

#[macro_export]
macro_rules! keymap {
    ($evt:expr, $($key:pat_param $(| $($mods:ident)-+)? => $action:expr),+ $(,)?) => {
        match $evt.code {
            $(
                $key => {
                    if $crate::keymap!(@check_mods $evt, $($($mods),+)?) {
                        $action
                    }
                },
            )+
            _ => {}
        }
    };
    (@check_mods $evt:expr,) => { true };
    (@check_mods $evt:expr, $($mods:ident),+) => {
        $evt.modifiers == ($(::ratatui::crossterm::event::KeyModifiers::$mods)|+)
    };
}
