//! Card templates for the synced note type.

use crate::remote::{NoteModel, FIELD_NAMES, MODEL_NAME};

const FRONT_TEMPLATE: &str = r#"{{#Breadcrumb}}<div class="breadcrumb">{{Breadcrumb}}</div>{{/Breadcrumb}}
<div class="text">{{Text}}</div>"#;

const BACK_TEMPLATE: &str = r#"{{#Breadcrumb}}<div class="breadcrumb">{{Breadcrumb}}</div>{{/Breadcrumb}}
<div class="text">{{Text}}</div>
{{#Extra}}<hr id="answer">
<div class="extra">{{Extra}}</div>{{/Extra}}"#;

const CSS: &str = r#".card {
  font-family: arial;
  font-size: 20px;
  text-align: left;
  color: black;
  background-color: white;
}
.breadcrumb {
  font-size: 12px;
  color: grey;
  margin-bottom: 12px;
}
.cloze {
  font-weight: bold;
  color: blue;
}"#;

impl NoteModel {
    /// The note type all blocks are synced into.
    pub fn standard() -> Self {
        Self {
            name: MODEL_NAME.to_string(),
            fields: FIELD_NAMES.iter().map(|f| f.to_string()).collect(),
            front_template: FRONT_TEMPLATE.to_string(),
            back_template: BACK_TEMPLATE.to_string(),
            css: CSS.to_string(),
        }
    }
}
