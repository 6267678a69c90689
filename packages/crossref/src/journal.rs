//! Journal encoding: metadata, issue and articles.

use crate::citations::{citation_list_xml, Citations};
use crate::common::{
    agree, license_from_frontmatter, license_xml, pages_xml, present, titles_xml, DocumentInput,
    EncodeOptions, Pages, Titles,
};
use crate::contributors::authors_from_frontmatter;
use crate::dates::{publication_dates_xml, PublicationDate};
use crate::doi::{doi_data_xml, DoiData};
use crate::error::{DepositError, Result};
use crate::funding::{fundref_from_frontmatter, fundref_xml, Fundref};
use crate::schema::SchemaVersion;
use crate::tree::{text_element, Element};

/// Fields of `<journal_metadata>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalMetadata {
    pub title: Option<String>,
    pub abbrev_title: Option<String>,
    /// Electronic ISSN.
    pub issn: Option<String>,
    pub doi_data: Option<DoiData>,
}

/// Build `<journal_metadata>`.
///
/// Required: title.
pub fn journal_metadata_xml(metadata: &JournalMetadata) -> Result<Element> {
    let title = present(metadata.title.as_deref()).ok_or_else(|| DepositError::missing("title"))?;
    Ok(Element::new("journal_metadata").with_children([
        Some(text_element("full_title", title)),
        present(metadata.abbrev_title.as_deref()).map(|abbr| text_element("abbrev_title", abbr)),
        present(metadata.issn.as_deref())
            .map(|issn| text_element("issn", issn).with_attribute("media_type", "electronic")),
        metadata.doi_data.as_ref().map(doi_data_xml),
    ]))
}

/// Fields of `<journal_issue>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalIssue {
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub publication_dates: Vec<PublicationDate>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub doi_data: Option<DoiData>,
}

/// Build `<journal_issue>`.
///
/// Required: at least one publication date.
pub fn journal_issue_xml(issue: &JournalIssue) -> Result<Element> {
    if issue.publication_dates.is_empty() {
        return Err(DepositError::missing_in("date", "journal_issue"));
    }
    Ok(Element::new("journal_issue")
        .with_child(issue.contributors.clone())
        .with_child((!issue.titles.is_empty()).then(|| titles_xml(&issue.titles)))
        .with_children(publication_dates_xml(&issue.publication_dates)?)
        .with_child(
            present(issue.volume.as_deref())
                .map(|volume| Element::new("journal_volume").with_child(text_element("volume", volume))),
        )
        .with_child(present(issue.issue.as_deref()).map(|number| text_element("issue", number)))
        .with_child(issue.doi_data.as_ref().map(doi_data_xml)))
}

/// Fields of `<journal_article>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalArticle {
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub abstract_xml: Option<Element>,
    pub publication_dates: Vec<PublicationDate>,
    pub pages: Option<Pages>,
    pub funding: Vec<Fundref>,
    pub license: Option<String>,
    pub doi_data: Option<DoiData>,
    pub citations: Citations,
}

/// Build `<journal_article>`.
///
/// Required: title, DOI, at least one publication date.
pub fn journal_article_xml(article: &JournalArticle, version: SchemaVersion) -> Result<Element> {
    article.titles.require_title()?;
    let doi_data = article
        .doi_data
        .as_ref()
        .filter(|data| !data.doi.is_empty())
        .ok_or_else(|| DepositError::missing("doi"))?;
    if article.publication_dates.is_empty() {
        return Err(DepositError::missing("date"));
    }

    Ok(Element::new("journal_article")
        .with_attribute("publication_type", "full_text")
        .with_child(titles_xml(&article.titles))
        .with_child(article.contributors.clone())
        .with_child(article.abstract_xml.clone())
        .with_children(publication_dates_xml(&article.publication_dates)?)
        .with_child(article.pages.as_ref().map(pages_xml))
        .with_child(fundref_xml(&article.funding, version)?)
        .with_child(article.license.as_deref().map(license_xml))
        .with_child(doi_data_xml(doi_data))
        .with_child(citation_list_xml(&article.citations)))
}

/// Build `<journal>` from metadata, an optional issue and articles.
pub fn journal_xml(
    metadata: &JournalMetadata,
    issue: Option<&JournalIssue>,
    articles: &[JournalArticle],
    version: SchemaVersion,
) -> Result<Element> {
    let mut journal = Element::new("journal").with_child(journal_metadata_xml(metadata)?);
    if let Some(issue) = issue {
        journal.push(journal_issue_xml(issue)?);
    }
    for article in articles {
        journal.push(journal_article_xml(article, version)?);
    }
    Ok(journal)
}

/// Extract article fields from frontmatter.
pub fn journal_article_from_frontmatter(
    input: &DocumentInput<'_>,
    opts: &EncodeOptions,
) -> Result<JournalArticle> {
    let fm = input.frontmatter;
    Ok(JournalArticle {
        contributors: authors_from_frontmatter(fm, opts.version)?,
        titles: Titles::from_frontmatter(fm),
        abstract_xml: input.abstract_element(),
        publication_dates: fm.publication_date().into_iter().collect(),
        pages: Pages::from_frontmatter(fm),
        funding: fundref_from_frontmatter(fm)?,
        license: license_from_frontmatter(fm),
        doi_data: opts.doi_data(fm.doi.as_deref()),
        citations: input.citations.clone(),
    })
}

/// Combine several articles into one `<journal>`.
///
/// Journal title, abbreviation, ISSN and DOI come from `overrides` when set,
/// otherwise from the articles' `venue`, which must agree. When the articles
/// carry a volume or issue (which must also agree) a `<journal_issue>` dated
/// like the first dated article is added.
///
/// # Errors
/// `DepositError::ConflictingValues` when articles disagree, plus any
/// encoding error of the parts.
pub fn journal_from_frontmatters(
    overrides: &JournalMetadata,
    articles: &[DocumentInput<'_>],
    opts: &EncodeOptions,
) -> Result<Element> {
    let venues: Vec<_> = articles
        .iter()
        .map(|input| input.frontmatter.venue.clone().unwrap_or_default())
        .collect();
    let biblios: Vec<_> = articles
        .iter()
        .map(|input| input.frontmatter.biblio.clone().unwrap_or_default())
        .collect();

    let pick = |explicit: &Option<String>, field: &str, values: Vec<Option<&str>>| -> Result<Option<String>> {
        match present(explicit.as_deref()) {
            Some(value) => Ok(Some(value.to_string())),
            None => Ok(agree(field, values)?.map(str::to_string)),
        }
    };

    let title = pick(
        &overrides.title,
        "venue.title",
        venues.iter().map(|v| v.title.as_deref()).collect(),
    )?;
    let abbrev_title = pick(
        &overrides.abbrev_title,
        "venue.short_title",
        venues.iter().map(|v| v.short_title.as_deref()).collect(),
    )?;
    let issn = pick(
        &overrides.issn,
        "venue.issn",
        venues.iter().map(|v| v.issn.as_deref()).collect(),
    )?;
    let doi_data = match &overrides.doi_data {
        Some(data) => Some(data.clone()),
        None => opts.doi_data(agree("venue.doi", venues.iter().map(|v| v.doi.as_deref()))?),
    };
    let metadata = JournalMetadata {
        title,
        abbrev_title,
        issn,
        doi_data,
    };

    let volume = agree("biblio.volume", biblios.iter().map(|b| b.volume.as_deref()))?;
    let number = agree("biblio.issue", biblios.iter().map(|b| b.issue.as_deref()))?;

    let encoded = articles
        .iter()
        .map(|input| journal_article_from_frontmatter(input, opts))
        .collect::<Result<Vec<_>>>()?;

    let issue = (volume.is_some() || number.is_some()).then(|| JournalIssue {
        publication_dates: encoded
            .iter()
            .find_map(|article| article.publication_dates.first().cloned())
            .into_iter()
            .collect(),
        volume: volume.map(str::to_string),
        issue: number.map(str::to_string),
        ..JournalIssue::default()
    });

    journal_xml(&metadata, issue.as_ref(), &encoded, opts.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::Frontmatter;
    use pretty_assertions::assert_eq;

    fn article() -> JournalArticle {
        JournalArticle {
            titles: Titles::new("An article"),
            publication_dates: vec![PublicationDate::year(2023)],
            doi_data: Some(DoiData::new("10.1234/article", "https://example.com/article")),
            ..JournalArticle::default()
        }
    }

    #[test]
    fn test_journal_metadata() {
        let metadata = JournalMetadata {
            title: Some("Journal of Examples".to_string()),
            abbrev_title: Some("J. Ex.".to_string()),
            issn: None,
            doi_data: None,
        };
        assert_eq!(
            journal_metadata_xml(&metadata).unwrap().to_xml().unwrap(),
            "<journal_metadata><full_title>Journal of Examples</full_title><abbrev_title>J. Ex.</abbrev_title></journal_metadata>"
        );
        assert_eq!(
            journal_metadata_xml(&JournalMetadata::default()).unwrap_err().to_string(),
            "Missing required field: title"
        );
    }

    #[test]
    fn test_journal_issue_requires_date() {
        let issue = JournalIssue {
            volume: Some("3".to_string()),
            ..JournalIssue::default()
        };
        assert!(journal_issue_xml(&issue).is_err());

        let dated = JournalIssue {
            publication_dates: vec![PublicationDate::year_month(2023, 4)],
            ..issue
        };
        assert_eq!(
            journal_issue_xml(&dated).unwrap().to_xml().unwrap(),
            concat!(
                r#"<journal_issue><publication_date media_type="online"><month>04</month><year>2023</year></publication_date>"#,
                "<journal_volume><volume>3</volume></journal_volume></journal_issue>"
            )
        );
    }

    #[test]
    fn test_article_order() {
        let full = JournalArticle {
            contributors: Some(Element::new("contributors")),
            abstract_xml: Some(Element::new("jats:abstract")),
            pages: Some(Pages::new("1", Some("6".to_string()))),
            license: Some("https://creativecommons.org/licenses/by/4.0/".to_string()),
            ..article()
        };
        let el = journal_article_xml(&full, SchemaVersion::V5_3_1).unwrap();
        let order: Vec<_> = el.elements().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "titles",
                "contributors",
                "jats:abstract",
                "publication_date",
                "pages",
                "ai:program",
                "doi_data"
            ]
        );
    }

    #[test]
    fn test_article_required_fields() {
        let no_title = JournalArticle { titles: Titles::default(), ..article() };
        assert!(matches!(
            journal_article_xml(&no_title, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "title"
        ));
        let no_doi = JournalArticle { doi_data: None, ..article() };
        assert!(matches!(
            journal_article_xml(&no_doi, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "doi"
        ));
        let no_date = JournalArticle { publication_dates: Vec::new(), ..article() };
        assert!(matches!(
            journal_article_xml(&no_date, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "date"
        ));
    }

    fn frontmatter(title: &str, venue: &str, doi: &str) -> Frontmatter {
        Frontmatter::from_yaml(&format!(
            "title: {title}\ndoi: {doi}\ndate: 2023-03-01\nvenue:\n  title: {venue}\nbiblio:\n  volume: 4\n  issue: 2\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_journal_from_frontmatters() {
        let a = frontmatter("First", "Journal A", "10.1234/a");
        let b = frontmatter("Second", "Journal A", "10.1234/b");
        let inputs = [DocumentInput::new(&a), DocumentInput::new(&b)];
        let el = journal_from_frontmatters(&JournalMetadata::default(), &inputs, &EncodeOptions::default())
            .unwrap();

        let children: Vec<_> = el.elements().map(|c| c.name.as_str()).collect();
        assert_eq!(
            children,
            vec!["journal_metadata", "journal_issue", "journal_article", "journal_article"]
        );
        assert_eq!(el.find("full_title").unwrap().text_content(), "Journal A");
        assert_eq!(el.find("volume").unwrap().text_content(), "4");
        assert_eq!(el.find("issue").unwrap().text_content(), "2");
    }

    #[test]
    fn test_journal_from_frontmatters_conflict() {
        let a = frontmatter("First", "Journal A", "10.1234/a");
        let b = frontmatter("Second", "Journal B", "10.1234/b");
        let inputs = [DocumentInput::new(&a), DocumentInput::new(&b)];
        let err = journal_from_frontmatters(&JournalMetadata::default(), &inputs, &EncodeOptions::default())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Journal A") && message.contains("Journal B"), "{message}");
    }

    #[test]
    fn test_overrides_win_over_venue() {
        let a = frontmatter("First", "Journal A", "10.1234/a");
        let b = frontmatter("Second", "Journal B", "10.1234/b");
        let overrides = JournalMetadata {
            title: Some("Override".to_string()),
            ..JournalMetadata::default()
        };
        let inputs = [DocumentInput::new(&a), DocumentInput::new(&b)];
        let el = journal_from_frontmatters(&overrides, &inputs, &EncodeOptions::default()).unwrap();
        assert_eq!(el.find("full_title").unwrap().text_content(), "Override");
    }
}
