//! Routing directives.
//!
//! When web-search mode is on or an image is attached, the backend is told
//! to force a specialist path. The structured [`RoutingHint`] travels in its
//! own envelope field; older backends only understand the textual form,
//! where the user's literal text is embedded under a fixed header.
//!
//! ```text
//! 【Web検索リクエスト】
//! 以下の質問について、必ずWeb検索を使って最新の情報を調べて回答してください。
//!
//! ユーザーの質問: 近くの病院
//! ```

use serde::{Deserialize, Serialize};

/// Header line of the web-search directive.
pub const WEB_SEARCH_DIRECTIVE_HEADER: &str = "【Web検索リクエスト】";

/// Header line of the image-analysis directive.
pub const IMAGE_ANALYSIS_DIRECTIVE_HEADER: &str = "【画像分析リクエスト】";

const WEB_SEARCH_INSTRUCTION: &str =
    "以下の質問について、必ずWeb検索を使って最新の情報を調べて回答してください。";
const IMAGE_ANALYSIS_INSTRUCTION: &str =
    "添付された画像を必ず画像分析の専門エージェントで分析してから回答してください。";

const WEB_SEARCH_LABEL: &str = "ユーザーの質問: ";
const IMAGE_ANALYSIS_LABEL: &str = "ユーザーのメッセージ: ";

/// Specialist path the backend should take for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingHint {
    WebSearch,
    ImageAnalysis,
}

impl RoutingHint {
    /// Pick the hint for the current input modes.
    ///
    /// The two modes are mutually exclusive upstream; if both ever show up,
    /// the attachment wins because the image cannot be analysed any other way.
    pub fn for_modes(web_search: bool, has_image: bool) -> Option<Self> {
        match (web_search, has_image) {
            (_, true) => Some(RoutingHint::ImageAnalysis),
            (true, false) => Some(RoutingHint::WebSearch),
            (false, false) => None,
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            RoutingHint::WebSearch => WEB_SEARCH_DIRECTIVE_HEADER,
            RoutingHint::ImageAnalysis => IMAGE_ANALYSIS_DIRECTIVE_HEADER,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            RoutingHint::WebSearch => WEB_SEARCH_INSTRUCTION,
            RoutingHint::ImageAnalysis => IMAGE_ANALYSIS_INSTRUCTION,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RoutingHint::WebSearch => WEB_SEARCH_LABEL,
            RoutingHint::ImageAnalysis => IMAGE_ANALYSIS_LABEL,
        }
    }

    /// Embed `text` in this hint's textual directive.
    pub fn wrap(&self, text: &str) -> String {
        format!(
            "{}\n{}\n\n{}{}",
            self.header(),
            self.instruction(),
            self.label(),
            text
        )
    }

    /// Recover the hint and literal user text from a wrapped message.
    ///
    /// Only an exact directive prefix matches, so user text that merely
    /// mentions a header is not mistaken for a directive.
    pub fn unwrap_directive(message: &str) -> Option<(Self, &str)> {
        [RoutingHint::WebSearch, RoutingHint::ImageAnalysis]
            .into_iter()
            .find_map(|hint| {
                let prefix = format!("{}\n{}\n\n{}", hint.header(), hint.instruction(), hint.label());
                message.strip_prefix(prefix.as_str()).map(|rest| (hint, rest))
            })
    }
}
