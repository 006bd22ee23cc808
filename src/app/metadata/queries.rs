//! SQL run against publication databases

/// (DocumentId, FirstDateOffset) of every dated document
pub const MIDWEEK_DOCUMENTS: &str = r#"
    SELECT DocumentId, FirstDateOffset
    FROM DatedText
    ORDER BY DocumentId, FirstDateOffset
"#;

/// (DocumentId, FirstDateOffset) of every study article; binds: class
pub const WEEKEND_DOCUMENTS: &str = r#"
    SELECT Document.DocumentId, DatedText.FirstDateOffset
    FROM Document
    INNER JOIN DatedText ON DatedText.DocumentId = Document.DocumentId
    WHERE Document.Class = ?
    ORDER BY Document.DocumentId
"#;

/// Number of study articles dated a given day; binds: date offset, class
pub const ARTICLES_FOR_DATE: &str = r#"
    SELECT COUNT(*)
    FROM DatedText
    INNER JOIN Document ON Document.DocumentId = DatedText.DocumentId
    WHERE DatedText.FirstDateOffset = ? AND Document.Class = ?
"#;

/// Song tracks of the study article dated a given day; binds: date offset, class, symbol
pub const ARTICLE_SONGS: &str = r#"
    SELECT Multimedia.Track
    FROM DatedText
    INNER JOIN Document ON Document.DocumentId = DatedText.DocumentId
    INNER JOIN DocumentMultimedia ON DocumentMultimedia.DocumentId = DatedText.DocumentId
    INNER JOIN Multimedia ON Multimedia.MultimediaId = DocumentMultimedia.MultimediaId
    WHERE DatedText.FirstDateOffset = ?
      AND Document.Class = ?
      AND Multimedia.KeySymbol = ?
      AND Multimedia.Track IS NOT NULL
    ORDER BY DocumentMultimedia.BeginParagraphOrdinal, Multimedia.MultimediaId
"#;

/// Song tracks of one document; binds: document id, symbol
pub const DOCUMENT_SONGS: &str = r#"
    SELECT Multimedia.Track
    FROM DocumentMultimedia
    INNER JOIN Multimedia ON Multimedia.MultimediaId = DocumentMultimedia.MultimediaId
    WHERE DocumentMultimedia.DocumentId = ?
      AND Multimedia.KeySymbol = ?
      AND Multimedia.Track IS NOT NULL
    ORDER BY DocumentMultimedia.BeginParagraphOrdinal, Multimedia.MultimediaId
"#;

/// Image entry names of one document; binds: document id, cover category
pub const DOCUMENT_IMAGES: &str = r#"
    SELECT Multimedia.FilePath
    FROM DocumentMultimedia
    INNER JOIN Multimedia ON Multimedia.MultimediaId = DocumentMultimedia.MultimediaId
    WHERE DocumentMultimedia.DocumentId = ?
      AND Multimedia.MimeType LIKE 'image/%'
      AND IFNULL(Multimedia.CategoryType, 0) <> ?
      AND Multimedia.FilePath IS NOT NULL
    ORDER BY DocumentMultimedia.BeginParagraphOrdinal, Multimedia.MultimediaId
"#;

/// Addressing columns of the non-song videos of one document;
/// binds: document id, mime type, song symbol
pub const DOCUMENT_VIDEOS: &str = r#"
    SELECT Multimedia.KeySymbol,
           Multimedia.Track,
           IFNULL(Multimedia.IssueTagNumber, 0),
           Multimedia.MepsDocumentId
    FROM DocumentMultimedia
    INNER JOIN Multimedia ON Multimedia.MultimediaId = DocumentMultimedia.MultimediaId
    WHERE DocumentMultimedia.DocumentId = ?
      AND Multimedia.MimeType = ?
      AND IFNULL(Multimedia.KeySymbol, '') <> ?
    ORDER BY DocumentMultimedia.BeginParagraphOrdinal, Multimedia.MultimediaId
"#;
