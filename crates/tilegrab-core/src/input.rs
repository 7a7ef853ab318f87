//! Pointer button bindings that start drag sessions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input handling errors
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid button: {0}")]
    Button(String),
    #[error("Invalid binding: {0}")]
    Binding(String),
    #[error("Unknown drag command: {0}")]
    Command(String),
}

bitflags! {
    /// Keyboard modifiers held with the button
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT     = 0b0000_0001;
        const CTRL      = 0b0000_0010;
        const ALT       = 0b0000_0100;
        const SUPER     = 0b0000_1000;
    }
}

impl Modifiers {
    fn parse_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "shift" => Some(Self::SHIFT),
            "ctrl" | "control" => Some(Self::CTRL),
            "alt" | "mod1" => Some(Self::ALT),
            "super" | "mod4" | "logo" | "win" => Some(Self::SUPER),
            _ => None,
        }
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn from_name(name: &str) -> Result<Self, InputError> {
        match name.to_lowercase().as_str() {
            "button1" | "left" | "lmb" => Ok(Self::Left),
            "button2" | "middle" | "mmb" => Ok(Self::Middle),
            "button3" | "right" | "rmb" => Ok(Self::Right),
            _ => Err(InputError::Button(name.to_string())),
        }
    }
}

/// A mouse binding (modifiers + button)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseBinding {
    pub modifiers: Modifiers,
    pub button: MouseButton,
}

impl MouseBinding {
    /// Parse a binding string like "Mod4+button1"
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let mut modifiers = Modifiers::empty();
        let mut button_part: Option<&str> = None;

        for part in s.split('+') {
            let part = part.trim();
            if let Some(modifier) = Modifiers::parse_name(part) {
                modifiers.insert(modifier);
            } else if button_part.replace(part).is_some() {
                return Err(InputError::Binding(s.to_string()));
            }
        }

        let button = match button_part {
            Some(b) if !b.is_empty() => MouseButton::from_name(b)?,
            _ => return Err(InputError::Binding(s.to_string())),
        };

        Ok(Self { modifiers, button })
    }
}

/// Which drag a binding starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragOperation {
    Move,
    Resize,
}

impl DragOperation {
    pub fn from_command(command: &str) -> Result<Self, InputError> {
        match command.trim().to_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "resize" => Ok(Self::Resize),
            _ => Err(InputError::Command(command.to_string())),
        }
    }
}

impl std::str::FromStr for DragOperation {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_command(s)
    }
}

/// Resolved button binding table.
#[derive(Debug, Clone, Default)]
pub struct MouseBindings {
    bindings: Vec<(MouseBinding, DragOperation)>,
}

impl MouseBindings {
    pub fn add(&mut self, binding: MouseBinding, operation: DragOperation) {
        self.bindings.retain(|(existing, _)| *existing != binding);
        self.bindings.push((binding, operation));
    }

    pub fn lookup(&self, modifiers: Modifiers, button: MouseButton) -> Option<DragOperation> {
        self.bindings
            .iter()
            .find(|(binding, _)| binding.modifiers == modifiers && binding.button == button)
            .map(|(_, operation)| *operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_binding_parse() {
        let binding = MouseBinding::parse("Mod4+button1").unwrap();
        assert!(binding.modifiers.contains(Modifiers::SUPER));
        assert_eq!(binding.button, MouseButton::Left);

        let binding = MouseBinding::parse("Mod4+Shift+right").unwrap();
        assert!(binding.modifiers.contains(Modifiers::SUPER | Modifiers::SHIFT));
        assert_eq!(binding.button, MouseButton::Right);
    }

    #[test]
    fn test_mouse_binding_rejects_garbage() {
        assert!(matches!(
            MouseBinding::parse("Mod4"),
            Err(InputError::Binding(_))
        ));
        assert!(matches!(
            MouseBinding::parse("Mod4+button1+button3"),
            Err(InputError::Binding(_))
        ));
        assert!(matches!(
            MouseBinding::parse("Mod4+button9"),
            Err(InputError::Button(_))
        ));
    }

    #[test]
    fn test_drag_operation_from_command() {
        assert_eq!(DragOperation::from_command("move").unwrap(), DragOperation::Move);
        assert_eq!(" Resize".parse::<DragOperation>().unwrap(), DragOperation::Resize);
        assert!(DragOperation::from_command("exec xterm").is_err());
    }

    #[test]
    fn test_lookup_requires_exact_modifiers() {
        let mut bindings = MouseBindings::default();
        bindings.add(MouseBinding::parse("Mod4+button1").unwrap(), DragOperation::Move);
        bindings.add(MouseBinding::parse("Mod4+button3").unwrap(), DragOperation::Resize);

        assert_eq!(
            bindings.lookup(Modifiers::SUPER, MouseButton::Right),
            Some(DragOperation::Resize)
        );
        assert_eq!(
            bindings.lookup(Modifiers::SUPER | Modifiers::SHIFT, MouseButton::Left),
            None
        );
    }
}
