//! 알림 전송 -- Discord 채널 메시지
//!
//! - [`Notifier`]: 채널에 텍스트 하나를 보내는 전송 trait
//! - [`DiscordNotifier`]: Discord REST API 구현
//! - [`MessageFormatter`]: [`Finding`]을 Discord 마크다운 메시지로 변환
//! - [`NotifyingSink`]: 포매터와 전송기를 묶어 [`FindingSink`]로 노출

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use lockwatch_core::config::DiscordConfig;

use crate::error::ScannerError;
use crate::scanner::FindingSink;
use crate::types::Finding;

/// Discord 메시지 최대 길이 (문자 수)
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

const SEPARATOR_WIDTH: usize = 46;
const ELLIPSIS: char = '…';

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("URL pattern is a valid regex"));

/// 채널 메시지 전송 trait
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 채널에 메시지를 보냅니다. 실패는 모두 `Delivery` 에러입니다.
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ScannerError>;
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

/// Discord 봇 REST 클라이언트
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl DiscordNotifier {
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self, ScannerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("lockwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScannerError::Config {
                field: "discord".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &DiscordConfig) -> Result<Self, ScannerError> {
        Self::new(&config.api_url, config.token.clone())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ScannerError> {
        let url = format!("{}/channels/{}/messages", self.api_url, channel_id);
        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&CreateMessage { content: text })
            .send()
            .await
            .map_err(|e| ScannerError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(ScannerError::Delivery(format!(
                "discord returned {status}: {snippet}"
            )));
        }

        debug!(channel_id, chars = text.chars().count(), "discord message sent");
        Ok(())
    }
}

/// [`Finding`] -> Discord 마크다운
///
/// ```text
/// # 🚨 <@USER> **New vulnerability for PKG (ECOSYSTEM) in OWNER/REPO :**
/// ## 🔗 [ID](https://osv.dev/vulnerability/ID): SUMMARY
/// ## 📝 **Details:**
/// DETAILS
///
///
/// ## 🔗 **References:**
/// • <URL>
///
/// ━━━━━━━━
/// ```
///
/// 본문의 URL `m`은 `<m[..-1]>m[-1]` 형태로 감싸 미리보기를 막고(마지막 문자는 문장부호로 간주),
/// `####` 제목은 Discord가 렌더링하는 `###`로 낮춥니다.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    mention_user_id: String,
    limit: usize,
}

impl MessageFormatter {
    /// `mention_user_id`가 비어 있으면 멘션을 생략합니다.
    pub fn new(mention_user_id: impl Into<String>) -> Self {
        Self {
            mention_user_id: mention_user_id.into(),
            limit: DISCORD_MESSAGE_LIMIT,
        }
    }

    /// 메시지 길이 상한을 바꿉니다.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn format(&self, finding: &Finding) -> String {
        let mention = if self.mention_user_id.is_empty() {
            String::new()
        } else {
            format!("<@{}> ", self.mention_user_id)
        };

        let header = format!(
            "# 🚨 {mention}**New vulnerability for {} ({}) in {}/{} :**\n\
             ## 🔗 [{id}](https://osv.dev/vulnerability/{id}): {}\n\
             ## 📝 **Details:**\n",
            finding.package_name,
            finding.ecosystem,
            finding.owner,
            finding.repo_name,
            finding.summary,
            id = finding.id,
        );
        let details = rewrite_details(&finding.details);
        let mut references: Vec<String> = finding
            .references
            .iter()
            .map(|r| format!("• <{}>\n", r.url))
            .collect();
        let footer = format!("\n\n{}\n", "━".repeat(SEPARATOR_WIDTH));

        let assemble = |details: &str, references: &[String]| {
            let mut message = String::with_capacity(header.len() + details.len() + 256);
            message.push_str(&header);
            message.push_str(details);
            message.push_str("\n\n\n## 🔗 **References:**\n");
            for reference in references {
                message.push_str(reference);
            }
            message.push_str(&footer);
            message
        };

        let full = assemble(&details, &references);
        let full_len = full.chars().count();
        if full_len <= self.limit {
            return full;
        }

        // 본문을 먼저 줄임
        let details_len = details.chars().count();
        let fixed_len = full_len - details_len;
        if fixed_len < self.limit {
            let keep = self.limit - fixed_len - 1;
            let mut shortened: String = details.chars().take(keep).collect();
            // 잘린 `<https://…` 표식은 통째로 버림
            if let Some(open) = shortened.rfind("<http") {
                if !shortened[open..].contains('>') {
                    shortened.truncate(open);
                }
            }
            shortened.push(ELLIPSIS);
            return assemble(&shortened, &references);
        }

        // 참고 링크만으로도 넘치면 뒤에서부터 버림
        let ellipsis = ELLIPSIS.to_string();
        while !references.is_empty() {
            references.pop();
            let candidate = assemble(&ellipsis, &references);
            if candidate.chars().count() <= self.limit {
                return candidate;
            }
        }

        assemble(&ellipsis, &references)
            .chars()
            .take(self.limit)
            .collect()
    }
}

/// 본문 URL 감싸기와 `####` 치환
fn rewrite_details(details: &str) -> String {
    let wrapped = URL_PATTERN.replace_all(details, |caps: &regex::Captures<'_>| {
        let m = &caps[0];
        match m.char_indices().last() {
            Some((idx, _)) => format!("<{}>{}", &m[..idx], &m[idx..]),
            None => m.to_owned(),
        }
    });
    wrapped.replace("####", "###")
}

/// 포맷 후 채널로 전송하는 [`FindingSink`]
pub struct NotifyingSink<N> {
    notifier: N,
    formatter: MessageFormatter,
    channel_id: String,
}

impl<N: Notifier> NotifyingSink<N> {
    pub fn new(notifier: N, formatter: MessageFormatter, channel_id: impl Into<String>) -> Self {
        Self {
            notifier,
            formatter,
            channel_id: channel_id.into(),
        }
    }
}

impl NotifyingSink<DiscordNotifier> {
    /// Discord 설정으로 전송기, 포매터, 채널을 한 번에 구성합니다.
    pub fn discord(config: &DiscordConfig) -> Result<Self, ScannerError> {
        Ok(Self::new(
            DiscordNotifier::from_config(config)?,
            MessageFormatter::new(config.mention_user_id.clone()),
            config.channel_id.clone(),
        ))
    }
}

#[async_trait]
impl<N: Notifier> FindingSink for NotifyingSink<N> {
    async fn deliver(&self, finding: &Finding) -> Result<(), ScannerError> {
        let message = self.formatter.format(finding);
        self.notifier.send(&self.channel_id, &message).await
    }
}
