// ABOUTME: iTerm2 terminal inline image protocol implementation
// ABOUTME: Handles base64 encoding with iTerm2-specific escape sequences

use super::ImageProtocol;
use base64::{engine::general_purpose::STANDARD, Engine};

#[derive(Debug, Default, Clone, Copy)]
pub struct ITerm2Protocol;

impl ImageProtocol for ITerm2Protocol {
    fn render_image(&self, data: &[u8], name: &str) -> String {
        let base64_data = STANDARD.encode(data);
        let name_b64 = STANDARD.encode(name.as_bytes());

        // ITerm2 inline image format:
        // \x1b]1337;File=name=<base64 name>;size=<bytes>;inline=1:<base64 data>\x07
        format!(
            "\x1b]1337;File=name={};size={};inline=1:{}\x07\n",
            name_b64,
            data.len(),
            base64_data
        )
    }
}
