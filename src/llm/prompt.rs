use super::types::{ChatMessage, ChatRequest};

pub const SYSTEM_PROMPT: &str = "Eres un asistente especializado en el Plan de Desarrollo Estatal. \
Tu función es ayudar a los usuarios a encontrar información específica y precisa sobre políticas públicas, \
programas gubernamentales, objetivos estratégicos, metas, indicadores y cualquier otro aspecto contenido en el plan.

Proporciona respuestas claras, precisas y bien estructuradas. Cuando sea posible, cita secciones específicas \
del plan y proporciona contexto relevante. Mantén un tono profesional y formal, apropiado para un documento gubernamental.

Si la información solicitada no está disponible en el contexto proporcionado, indícalo claramente y sugiere \
alternativas o información relacionada que sí esté disponible.";

const PASSAGE_SEPARATOR: &str = "\n\n";

/// Retrieved passages become one context block, in ranking order.
pub fn build_context<S: AsRef<str>>(passages: &[S]) -> String {
    let parts: Vec<&str> = passages.iter().map(|p| p.as_ref()).collect();
    parts.join(PASSAGE_SEPARATOR)
}

pub fn render_user_message(query: &str, context: &str) -> String {
    format!(
        "CONSULTA: {query}\n\nINFORMACIÓN RELEVANTE DEL PLAN DE DESARROLLO ESTATAL:\n{context}\n\nRESPUESTA:"
    )
}

pub fn build_chat_request(query: &str, context: &str) -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(render_user_message(query, context)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_joins_passages_with_blank_line() {
        let passages = vec!["Eje 1: Seguridad".to_string(), "Eje 2: Salud".to_string()];
        assert_eq!(build_context(&passages), "Eje 1: Seguridad\n\nEje 2: Salud");
        assert_eq!(build_context::<String>(&[]), "");
    }

    #[test]
    fn request_embeds_query_and_context_verbatim() {
        let request = build_chat_request("¿Qué metas hay en salud?", "Meta 3.1 {literal}");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0]
            .content
            .contains("Plan de Desarrollo Estatal"));

        let user = &request.messages[1];
        assert_eq!(user.role, "user");
        assert!(user.content.contains("CONSULTA: ¿Qué metas hay en salud?"));
        assert!(user.content.contains("Meta 3.1 {literal}"));
        assert!(user.content.ends_with("RESPUESTA:"));
    }
}
