use serde_json::json;

/// A `generateContent` response carrying a single text part.
pub fn text_response_fixture(text: &str) -> String {
    return json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
    .to_string();
}

/// A `generateContent` response with some commentary followed by one inline
/// image, the way image models usually answer.
pub fn image_response_fixture(mime_type: &str, data: &str) -> String {
    return json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "Here is your wallpaper." },
                    { "inlineData": { "mimeType": mime_type, "data": data } }
                ]
            },
            "finishReason": "STOP"
        }]
    })
    .to_string();
}

/// A `generateContent` response that only contains text, as returned when
/// the model declines to draw.
pub fn imageless_response_fixture() -> String {
    return text_response_fixture("I can't create that image.");
}

pub fn error_response_fixture(code: u16, status: &str, message: &str) -> String {
    return json!({
        "error": {
            "code": code,
            "message": message,
            "status": status
        }
    })
    .to_string();
}
