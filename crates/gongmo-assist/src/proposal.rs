use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::info;

use crate::task::DeferredTask;

pub const PROJECT_TYPES: [&str; 4] = ["기술개발", "사업화", "연구개발", "마케팅"];

const DEFAULT_OBJECTIVES: &str = "본 프로젝트는 다음과 같은 목적을 달성하고자 합니다:\n- 혁신적인 기술 개발\n- 시장 경쟁력 강화\n- 고객 만족도 향상";

const WORD_STYLE: &str = "body{font-family:Malgun Gothic,sans-serif;padding:2rem;line-height:1.6}h1{font-size:1.5rem}h2{font-size:1.25rem;margin-top:1.5rem}h3{font-size:1.1rem;margin-top:1rem}";

/// Form inputs for the proposal generator. Blank fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ProposalRequest {
    pub project_name: String,
    pub project_type: String,
    pub budget: String,
    pub duration: String,
    pub objectives: String,
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

impl ProposalRequest {
    /// The fixed proposal template with this request's values substituted.
    pub fn render_markdown(&self) -> String {
        let name = or_default(&self.project_name, "프로젝트 제안서");
        let kind = or_default(&self.project_type, "사업");
        let objectives = or_default(&self.objectives, DEFAULT_OBJECTIVES);
        let duration = or_default(&self.duration, "12개월");
        let budget = or_default(&self.budget, "5억원");
        format!(
            "# {name}

## 1. 프로젝트 개요
본 제안서는 {kind} 분야의 혁신적인 프로젝트를 위한 것입니다.

## 2. 사업 목적
{objectives}

## 3. 사업 내용
### 3.1 추진 배경
현재 시장 환경에서 디지털 전환과 AI 기술의 중요성이 날로 증대되고 있습니다. 본 프로젝트는 이러한 시장 요구에 부응하여 혁신적인 솔루션을 제공하고자 합니다.

### 3.2 주요 내용
- **기술 개발**: 최신 AI 및 머신러닝 기술을 활용한 솔루션 개발
- **시장 진출**: 국내외 시장을 대상으로 한 전략적 진출
- **파트너십**: 주요 기업들과의 협력 체계 구축

## 4. 추진 일정
- **전체 기간**: {duration}
- **1단계** (1-3개월): 기획 및 설계
- **2단계** (4-8개월): 개발 및 테스트
- **3단계** (9-12개월): 출시 및 마케팅

## 5. 소요 예산
- **총 예산**: {budget}
- 인건비: 40%
- 개발비: 35%
- 마케팅비: 15%
- 기타 운영비: 10%

## 6. 기대 효과
### 6.1 경제적 효과
- 매출 증대: 연간 10억원 이상 예상
- 일자리 창출: 20명 이상의 신규 고용

### 6.2 기술적 효과
- 독자적 기술 확보
- 특허 출원 5건 이상
- 기술 경쟁력 향상

## 7. 결론
본 프로젝트는 혁신적인 기술과 전략적 접근을 통해 시장에서의 경쟁 우위를 확보하고, 지속 가능한 성장을 이루어낼 것입니다."
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProposal {
    pub markdown: String,
    pub generated_at: DateTime<Local>,
}

impl GeneratedProposal {
    /// Suggested download name for [`to_word_document`].
    pub fn file_name(&self) -> String {
        format!("proposal_{}.doc", self.generated_at.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Default)]
struct Desk {
    epoch: u64,
    request: ProposalRequest,
    pending: Option<DeferredTask>,
    generated: Option<GeneratedProposal>,
}

/// Mock generator: produces the template after a fixed delay. Only the most
/// recent request can complete.
#[derive(Debug, Clone)]
pub struct ProposalDesk {
    delay: Duration,
    inner: Arc<Mutex<Desk>>,
}

impl ProposalDesk {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Desk::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Desk> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generate(&self, request: ProposalRequest) {
        let mut desk = self.lock();
        if let Some(previous) = desk.pending.take() {
            previous.cancel();
        }
        desk.epoch += 1;
        let epoch = desk.epoch;
        desk.request = request.clone();

        let inner = self.inner.clone();
        let task = DeferredTask::start(
            "proposal",
            self.delay,
            move || request.render_markdown(),
            move |markdown| {
                let mut desk = inner.lock().unwrap_or_else(PoisonError::into_inner);
                if desk.epoch != epoch {
                    return;
                }
                desk.pending = None;
                desk.generated = Some(GeneratedProposal {
                    markdown,
                    generated_at: Local::now(),
                });
            },
        );
        desk.pending = Some(task);
        info!(epoch, "proposal generation started");
    }

    pub fn is_generating(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// The inputs of the latest request, for re-filling the form.
    pub fn last_request(&self) -> ProposalRequest {
        self.lock().request.clone()
    }

    pub fn generated(&self) -> Option<GeneratedProposal> {
        self.lock().generated.clone()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline_bold(line: &str) -> String {
    let parts = line.split("**").collect::<Vec<_>>();
    // An odd part count means every `**` has a partner.
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return line.to_string();
    }
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 1 {
                format!("<strong>{part}</strong>")
            } else {
                (*part).to_string()
            }
        })
        .collect()
}

/// Converts proposal Markdown into an HTML document Word opens as `.doc`.
/// Handles `#`..`###` headings and `**bold**`; the result starts with a UTF-8 BOM.
pub fn to_word_document(markdown: &str) -> String {
    let mut body = String::new();
    for line in markdown.lines() {
        let line = escape_html(line);
        if let Some(rest) = line.strip_prefix("### ") {
            body.push_str(&format!("<h3>{rest}</h3>"));
        } else if let Some(rest) = line.strip_prefix("## ") {
            body.push_str(&format!("<h2>{rest}</h2>"));
        } else if let Some(rest) = line.strip_prefix("# ") {
            body.push_str(&format!("<h1>{rest}</h1>"));
        } else {
            body.push_str(&inline_bold(&line));
            body.push_str("<br>");
        }
    }
    format!(
        "\u{feff}<!DOCTYPE html><html xmlns:o=\"urn:schemas-microsoft-com:office:office\" xmlns:w=\"urn:schemas-microsoft-com:office:word\"><head><meta charset=\"utf-8\"><title>제안서</title><!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View></w:WordDocument></xml><![endif]--><style>{WORD_STYLE}</style></head><body>{body}</body></html>"
    )
}
