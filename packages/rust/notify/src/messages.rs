//! Text rendering for chat notifications.

use paperscout_shared::{Paper, TranslationStatus};

/// Categories listed in the basic-info message.
const MAX_LISTED_CATEGORIES: usize = 3;

const UNKNOWN: &str = "不明";

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() { UNKNOWN } else { value }
}

/// Announces how many papers follow for a query.
pub fn render_header(count: usize) -> String {
    format!("🔬 本日の論文情報 ({count}件)\n{}", "=".repeat(30))
}

/// First message per paper: bibliographic details.
pub fn render_basic_info(paper: &Paper, n: usize, total: usize) -> String {
    let mut message = format!("[{n}/{total}] 📄 新しい論文\n\n");
    message.push_str(&format!("【タイトル】\n{}\n\n", or_unknown(&paper.title)));
    message.push_str(&format!("【著者】\n{}\n\n", or_unknown(&paper.authors_str())));
    message.push_str(&format!("【公開日】\n{}\n\n", or_unknown(&paper.published)));

    if let Some(pdf_url) = paper.pdf_url.as_deref().filter(|u| !u.is_empty()) {
        message.push_str(&format!("【PDF・詳細】\n{pdf_url}\n\n"));
    }

    if !paper.categories.is_empty() {
        let listed: Vec<&str> = paper
            .categories
            .iter()
            .take(MAX_LISTED_CATEGORIES)
            .map(String::as_str)
            .collect();
        message.push_str(&format!("【カテゴリ】\n{}", listed.join(", ")));
    }

    message.trim_end().to_string()
}

/// Second message per paper: the translated abstract, or the original with a
/// note saying whether translation was skipped or failed.
pub fn render_summary(paper: &Paper) -> String {
    let mut message = String::from("📝 要約（日本語翻訳）\n\n");

    if let Some(translated) = paper.translated_abstract.as_deref().filter(|t| !t.is_empty()) {
        message.push_str(translated);
        return message;
    }

    match &paper.translation {
        TranslationStatus::Skipped { reason } => {
            message.push_str(&format!("翻訳をスキップしたため（{reason}）、原文を表示します：\n\n"));
        }
        _ => message.push_str("翻訳に失敗したため、原文を表示します：\n\n"),
    }

    if paper.abstract_text.trim().is_empty() {
        message.push_str("要約なし");
    } else {
        message.push_str(&paper.abstract_text);
    }
    message
}

/// Sent when the search returned nothing for a query.
pub fn render_no_results(query: &str) -> String {
    format!("「{query}」に関する論文が見つかりませんでした。")
}

/// Sent when every result for a query was filtered out.
pub fn render_no_relevant(query: &str) -> String {
    format!("「{query}」に関連する論文が見つかりませんでした。")
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperscout_shared::SkipReason;

    fn paper() -> Paper {
        Paper {
            arxiv_id: "2401.01234v2".into(),
            url: "http://arxiv.org/abs/2401.01234v2".into(),
            title: "Deep Learning Estimation of Typhoon Eye Size".into(),
            authors: vec!["Hanako Sato".into(), "John Smith".into()],
            abstract_text: "We estimate the eye size of tropical cyclones.".into(),
            published: "2024-01-03".into(),
            categories: vec![
                "physics.ao-ph".into(),
                "cs.CV".into(),
                "cs.LG".into(),
                "stat.ML".into(),
            ],
            pdf_url: Some("http://arxiv.org/pdf/2401.01234v2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn header_counts_papers() {
        let header = render_header(2);
        assert!(header.starts_with("🔬 本日の論文情報 (2件)\n"));
        assert!(header.ends_with(&"=".repeat(30)));
    }

    #[test]
    fn basic_info_lists_details() {
        let message = render_basic_info(&paper(), 1, 2);
        assert!(message.starts_with("[1/2] 📄 新しい論文"));
        assert!(message.contains("【タイトル】\nDeep Learning Estimation of Typhoon Eye Size"));
        assert!(message.contains("【著者】\nHanako Sato, John Smith"));
        assert!(message.contains("【公開日】\n2024-01-03"));
        assert!(message.contains("【PDF・詳細】\nhttp://arxiv.org/pdf/2401.01234v2"));
        assert!(message.ends_with("【カテゴリ】\nphysics.ao-ph, cs.CV, cs.LG"));
    }

    #[test]
    fn basic_info_without_optional_parts() {
        let bare = Paper {
            title: "Untitled".into(),
            ..Default::default()
        };
        let message = render_basic_info(&bare, 1, 1);
        assert!(message.contains("【著者】\n不明"));
        assert!(!message.contains("PDF"));
        assert!(!message.contains("カテゴリ"));
    }

    #[test]
    fn summary_prefers_translation() {
        let mut p = paper();
        p.translated_abstract = Some("熱帯低気圧の目の大きさを推定する。".into());
        p.translation = TranslationStatus::Translated;
        let message = render_summary(&p);
        assert!(message.ends_with("熱帯低気圧の目の大きさを推定する。"));
        assert!(!message.contains("原文"));
    }

    #[test]
    fn summary_distinguishes_skip_from_failure() {
        let mut p = paper();
        p.translation = TranslationStatus::Skipped {
            reason: SkipReason::InsufficientQuota {
                needed: 46,
                remaining: 10,
            },
        };
        let skipped = render_summary(&p);
        assert!(skipped.contains("スキップ"));
        assert!(skipped.contains("need 46, have 10"));
        assert!(skipped.ends_with(&p.abstract_text));

        p.translation = TranslationStatus::Failed {
            reason: "HTTP 500".into(),
        };
        let failed = render_summary(&p);
        assert!(failed.contains("失敗"));
        assert!(failed.ends_with(&p.abstract_text));
    }

    #[test]
    fn summary_without_abstract() {
        let p = Paper::default();
        assert!(render_summary(&p).ends_with("要約なし"));
    }

    #[test]
    fn query_notices() {
        assert_eq!(
            render_no_results("typhoon eye"),
            "「typhoon eye」に関する論文が見つかりませんでした。"
        );
        assert_eq!(
            render_no_relevant("typhoon eye"),
            "「typhoon eye」に関連する論文が見つかりませんでした。"
        );
    }
}
