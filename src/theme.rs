use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub stroke_color: String,
    pub node_background: String,
    pub text_color: String,
    pub line_color: String,
    pub label_background: String,
    pub view_background: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            stroke_color: "#1e1e1e".to_string(),
            node_background: "#a5d8ff".to_string(),
            text_color: "#1e1e1e".to_string(),
            line_color: "#1e1e1e".to_string(),
            label_background: "transparent".to_string(),
            view_background: "#ffffff".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            node_background: "#1971c2".to_string(),
            view_background: "#1e1e1e".to_string(),
            ..Self::light()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_share_stroke_color() {
        let light = Theme::light();
        let dark = Theme::dark();
        assert_eq!(light.stroke_color, dark.stroke_color);
        assert_ne!(light.node_background, dark.node_background);
        assert_eq!(dark.view_background, "#1e1e1e");
        assert_eq!(light.label_background, "transparent");
    }
}
