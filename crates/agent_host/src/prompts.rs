//! Persona and canned bot phrases.

use shared::agent_api::Turn;

pub const DEFAULT_PERSONA: &str = "Kamu adalah chatbot AI yang cerdas, tengil, dan punya selera humor. \
Kamu bisa deteksi bahasa pengguna (Sunda, Indonesia, atau Inggris), \
dan balas dengan gaya santai, lucu, kadang nyolot. Namun tetap sopan. \
Fokus ke topik user.";

/// System instruction sent with every text request. A blank override falls
/// back to the default persona.
pub fn system_instruction(persona: Option<&str>) -> Turn {
    let persona = persona
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PERSONA);
    Turn::system_text(persona)
}

pub fn image_caption(prompt: &str) -> String {
    let subject = if prompt.is_empty() {
        "permintaanmu"
    } else {
        prompt
    };
    format!("Siap! Ini gambarnya untuk: **{subject}**")
}

pub fn image_alt(prompt: &str) -> String {
    if prompt.is_empty() {
        "generated image".to_string()
    } else {
        prompt.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::Role;

    #[test]
    fn test_system_instruction_override() {
        let turn = system_instruction(Some("You are terse."));
        assert_eq!(turn.role, Role::System);
        assert_eq!(turn.text(), Some("You are terse."));

        assert_eq!(system_instruction(Some("  ")).text(), Some(DEFAULT_PERSONA));
        assert_eq!(system_instruction(None).text(), Some(DEFAULT_PERSONA));
    }

    #[test]
    fn test_image_caption() {
        assert_eq!(
            image_caption("kucing oren"),
            "Siap! Ini gambarnya untuk: **kucing oren**"
        );
        assert_eq!(
            image_caption(""),
            "Siap! Ini gambarnya untuk: **permintaanmu**"
        );
        assert_eq!(image_alt(""), "generated image");
    }
}
