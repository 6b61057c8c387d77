//! Draft editor for the create/edit form.

use transport_gateway::{NewRecord, Record, RecordId, RecordPatch};

use crate::validation::{validate_all, validate_field, Field, RecordDraft, ValidationErrors};

/// What a valid draft turns into on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(NewRecord),
    Update { id: RecordId, patch: RecordPatch },
}

/// The record being created or edited, with its live error map.
///
/// `target` is `None` in create mode and holds the record being edited in
/// update mode.
#[derive(Debug, Clone, Default)]
pub struct DraftEditor {
    draft: RecordDraft,
    target: Option<Record>,
    errors: ValidationErrors,
}

impl DraftEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty draft in create mode.
    pub fn start_create(&mut self) {
        self.clear();
    }

    /// Start editing `record`, pre-filling the draft from it.
    pub fn start_edit(&mut self, record: &Record) {
        self.draft = RecordDraft::from_record(record);
        self.target = Some(record.clone());
        self.errors = ValidationErrors::default();
    }

    pub fn is_editing(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&Record> {
        self.target.as_ref()
    }

    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    /// Errors collected from field changes so far.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Set a field and validate it immediately. Returns the field's error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Option<&str> {
        self.draft.set(field, value);
        match validate_field(field, self.draft.get(field)) {
            Some(message) => self.errors.insert(field, message),
            None => self.errors.remove(field),
        }
        self.errors.get(field)
    }

    /// Whether the whole draft currently validates.
    pub fn can_submit(&self) -> bool {
        validate_all(&self.draft).is_empty()
    }

    /// Validate every field and build the submission.
    ///
    /// On failure the live error map is replaced by the full one.
    pub fn prepare(&mut self) -> Result<Submission, ValidationErrors> {
        let record = match self.draft.to_new_record() {
            Ok(record) => record,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(errors);
            }
        };
        Ok(match &self.target {
            Some(target) => Submission::Update {
                id: target.id.clone(),
                patch: RecordPatch::from(record),
            },
            None => Submission::Create(record),
        })
    }

    /// Reset to an empty create-mode draft.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{CAPACITY_INVALID, NAME_REQUIRED};
    use transport_gateway::TransportType;

    fn ferry() -> Record {
        NewRecord::new("Ferry", 12000.0, TransportType::Sea).with_id(RecordId::new("3"))
    }

    #[test]
    fn test_field_errors_track_live_input() {
        let mut editor = DraftEditor::new();
        assert_eq!(editor.set_field(Field::Name, "  "), Some(NAME_REQUIRED));
        assert_eq!(editor.set_field(Field::Capacity, "-5"), Some(CAPACITY_INVALID));
        assert_eq!(editor.errors().len(), 2);

        assert_eq!(editor.set_field(Field::Name, "Van"), None);
        assert_eq!(editor.errors().len(), 1);
        assert!(!editor.can_submit());

        editor.set_field(Field::Capacity, "1200");
        editor.set_field(Field::Type, "Land");
        assert!(editor.errors().is_empty());
        assert!(editor.can_submit());
    }

    #[test]
    fn test_untouched_fields_block_submit() {
        let mut editor = DraftEditor::new();
        editor.set_field(Field::Name, "Van");
        assert!(editor.errors().is_empty());
        assert!(!editor.can_submit());

        let errors = editor.prepare().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(editor.errors(), &errors);
    }

    #[test]
    fn test_create_mode_submission() {
        let mut editor = DraftEditor::new();
        editor.set_field(Field::Name, "Truck");
        editor.set_field(Field::Capacity, "500");
        editor.set_field(Field::Type, "Land");

        assert!(!editor.is_editing());
        assert_eq!(
            editor.prepare().unwrap(),
            Submission::Create(NewRecord::new("Truck", 500.0, TransportType::Land))
        );
    }

    #[test]
    fn test_edit_mode_prefills_and_targets_id() {
        let mut editor = DraftEditor::new();
        editor.start_edit(&ferry());
        assert!(editor.is_editing());
        assert_eq!(editor.draft().name, "Ferry");
        assert_eq!(editor.draft().capacity, "12000");

        editor.set_field(Field::Capacity, "15000");
        match editor.prepare().unwrap() {
            Submission::Update { id, patch } => {
                assert_eq!(id, RecordId::new("3"));
                assert_eq!(patch.capacity, Some(15000.0));
                assert_eq!(patch.kind, Some(TransportType::Sea));
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_returns_to_create_mode() {
        let mut editor = DraftEditor::new();
        editor.start_edit(&ferry());
        editor.set_field(Field::Name, "");
        editor.clear();

        assert!(!editor.is_editing());
        assert_eq!(editor.draft(), &RecordDraft::default());
        assert!(editor.errors().is_empty());
    }
}
