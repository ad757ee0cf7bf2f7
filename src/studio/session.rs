use serde::Serialize;

use crate::studio::error::{GenerationResult, StudioError};
use crate::studio::history::{History, HistoryEntry};
use crate::studio::payload::ImagePayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    OutfitFromText,
    OutfitChange,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::OutfitFromText => "outfit_from_text",
            Flow::OutfitChange => "outfit_change",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Pending,
    Succeeded(ImagePayload),
    Failed(StudioError),
}

impl FlowState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FlowState::Pending)
    }

    pub fn error(&self) -> Option<&StudioError> {
        match self {
            FlowState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Everything the browser UI reflects. Both flows keep their own state, so
/// overlapping invocations never clobber each other's status. Shared slots
/// (the outfit image, history) take whichever result lands last.
#[derive(Debug, Default)]
pub struct Session {
    character_image: Option<ImagePayload>,
    outfit_image: Option<ImagePayload>,
    outfit_flow: FlowState,
    change_flow: FlowState,
    history: History,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character_image(&self) -> Option<&ImagePayload> {
        self.character_image.as_ref()
    }

    pub fn outfit_image(&self) -> Option<&ImagePayload> {
        self.outfit_image.as_ref()
    }

    pub fn set_character_image(&mut self, image: ImagePayload) {
        self.character_image = Some(image);
    }

    pub fn clear_character_image(&mut self) {
        self.character_image = None;
    }

    pub fn set_outfit_image(&mut self, image: ImagePayload) {
        self.outfit_image = Some(image);
    }

    pub fn clear_outfit_image(&mut self) {
        self.outfit_image = None;
    }

    pub fn flow(&self, flow: Flow) -> &FlowState {
        match flow {
            Flow::OutfitFromText => &self.outfit_flow,
            Flow::OutfitChange => &self.change_flow,
        }
    }

    fn flow_mut(&mut self, flow: Flow) -> &mut FlowState {
        match flow {
            Flow::OutfitFromText => &mut self.outfit_flow,
            Flow::OutfitChange => &mut self.change_flow,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Both images for a composite request, or the validation error to show.
    pub fn change_inputs(&self) -> Result<(ImagePayload, ImagePayload), StudioError> {
        match (&self.character_image, &self.outfit_image) {
            (Some(character), Some(outfit)) => Ok((character.clone(), outfit.clone())),
            _ => Err(StudioError::validation(
                "Please upload both a character image and an outfit image.",
            )),
        }
    }

    pub fn begin(&mut self, flow: Flow) {
        *self.flow_mut(flow) = FlowState::Pending;
    }

    /// Records a rejection that happened before any request was made.
    pub fn reject(&mut self, flow: Flow, err: StudioError) {
        *self.flow_mut(flow) = FlowState::Failed(err);
    }

    /// A generated garment becomes the current outfit image.
    pub fn finish_outfit_from_text(&mut self, result: GenerationResult) -> GenerationResult {
        match &result {
            Ok(payload) => {
                self.outfit_image = Some(payload.clone());
                self.outfit_flow = FlowState::Succeeded(payload.clone());
            }
            Err(err) => self.outfit_flow = FlowState::Failed(err.clone()),
        }
        result
    }

    /// Successful composites go to the front of history; failures leave
    /// history and the previously displayed result alone.
    pub fn finish_outfit_change(
        &mut self,
        result: GenerationResult,
    ) -> Result<HistoryEntry, StudioError> {
        match result {
            Ok(payload) => {
                self.change_flow = FlowState::Succeeded(payload.clone());
                Ok(self.history.push(payload).clone())
            }
            Err(err) => {
                self.change_flow = FlowState::Failed(err.clone());
                Err(err)
            }
        }
    }

    pub fn displayed_result(&self) -> Option<&HistoryEntry> {
        self.history.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::error::ErrorKind;

    fn payload(data: &str) -> ImagePayload {
        ImagePayload::new(data, "image/png").unwrap()
    }

    #[test]
    fn history_holds_results_newest_first() {
        let mut session = Session::new();
        for data in ["R1", "R2", "R3", "R4"] {
            session.begin(Flow::OutfitChange);
            session.finish_outfit_change(Ok(payload(data))).unwrap();
        }

        let order: Vec<&str> = session
            .history()
            .entries()
            .iter()
            .map(|entry| entry.payload.data())
            .collect();
        assert_eq!(order, vec!["R4", "R3", "R2", "R1"]);
    }

    #[test]
    fn failure_keeps_history_and_displayed_result() {
        let mut session = Session::new();
        session.begin(Flow::OutfitChange);
        session.finish_outfit_change(Ok(payload("R1"))).unwrap();

        session.begin(Flow::OutfitChange);
        assert!(session.flow(Flow::OutfitChange).is_pending());
        let outcome = session.finish_outfit_change(Err(StudioError::api("timeout")));

        assert!(outcome.is_err());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.displayed_result().map(|e| e.payload.data()), Some("R1"));
        assert_eq!(
            session.flow(Flow::OutfitChange).error().map(|err| err.kind),
            Some(ErrorKind::Api)
        );
    }

    #[test]
    fn flows_do_not_share_state() {
        let mut session = Session::new();
        session.begin(Flow::OutfitFromText);
        session.begin(Flow::OutfitChange);
        let _ = session.finish_outfit_from_text(Err(StudioError::generation("no image")));

        assert!(session.flow(Flow::OutfitChange).is_pending());
        assert!(session.flow(Flow::OutfitFromText).error().is_some());
        assert!(session.history().is_empty());
    }

    #[test]
    fn generated_outfit_replaces_outfit_slot() {
        let mut session = Session::new();
        session.set_outfit_image(payload("OLD"));
        session.begin(Flow::OutfitFromText);
        session.finish_outfit_from_text(Ok(payload("NEW"))).unwrap();

        assert_eq!(session.outfit_image().map(|image| image.data()), Some("NEW"));
        assert_eq!(
            session.flow(Flow::OutfitFromText),
            &FlowState::Succeeded(payload("NEW"))
        );
    }

    #[test]
    fn change_inputs_require_both_images() {
        let mut session = Session::new();
        session.set_character_image(payload("C1"));
        assert_eq!(
            session.change_inputs().unwrap_err().kind,
            ErrorKind::Validation
        );

        session.set_outfit_image(payload("O1"));
        let (character, outfit) = session.change_inputs().unwrap();
        assert_eq!(character.data(), "C1");
        assert_eq!(outfit.data(), "O1");

        session.clear_character_image();
        assert!(session.change_inputs().is_err());
    }
}
