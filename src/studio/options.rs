use serde::Serialize;

use crate::studio::error::StudioError;

/// Selection value the UI sends when the user typed their own option.
pub const CUSTOM_OPTION_VALUE: &str = "custom";
pub const CUSTOM_OPTION_LABEL: &str = "Custom...";

pub const POSES: &[&str] = &[
    "Standing",
    "Sitting",
    "Walking",
    "Hands on hips",
    "Looking over the shoulder",
    "Dynamic action pose",
    "Leaning against a wall",
];

pub const CAMERA_ANGLES: &[&str] = &[
    "Front view",
    "Side view",
    "Three-quarter view",
    "Back view",
    "Low angle",
    "High angle",
    "Full body shot",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChoice {
    Preset(String),
    Custom(String),
}

impl OptionChoice {
    pub fn from_selection(selected: &str, custom: Option<&str>) -> Self {
        if selected == CUSTOM_OPTION_VALUE {
            OptionChoice::Custom(custom.unwrap_or_default().to_string())
        } else {
            OptionChoice::Preset(selected.to_string())
        }
    }

    pub fn resolve(&self) -> String {
        match self {
            OptionChoice::Preset(value) => value.trim().to_string(),
            OptionChoice::Custom(value) => value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOptions {
    pub pose: String,
    pub camera_angle: String,
    pub body_measurements: Option<String>,
}

impl GenerationOptions {
    /// Resolves both choices and validates the result. Blank measurements
    /// count as "not supplied".
    pub fn from_choices(
        pose: &OptionChoice,
        camera_angle: &OptionChoice,
        body_measurements: Option<&str>,
    ) -> Result<Self, StudioError> {
        let options = Self {
            pose: pose.resolve(),
            camera_angle: camera_angle.resolve(),
            body_measurements: body_measurements
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), StudioError> {
        if self.pose.trim().is_empty() {
            return Err(StudioError::validation("Please enter a custom pose."));
        }
        if self.camera_angle.trim().is_empty() {
            return Err(StudioError::validation("Please enter a custom camera angle."));
        }
        Ok(())
    }
}
