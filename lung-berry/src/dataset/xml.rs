//! LIDC 风格结节标注 (XML) 读取.
//!
//! 标注文件的根节点下是若干次阅片 (`readingSession`), 每次阅片包含:
//!
//! - `unblindedReadNodule`: 结节. 每个 `roi` 给出一个 `imageZposition` 和一圈 `edgeMap` 顶点.
//! - `nonNodule`: 非结节. 只有一个 `imageZposition` 和一个 `locus` 点.
//!
//! 顶点以 `(xCoord, yCoord)` 记录, 读取后转为库内统一的 `(h, w)`.

use crate::Idx2d;
use log::{debug, warn};
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 标注文件使用的命名空间.
const NIH_NS: &str = "http://www.nih.gov";

/// 某一层 (`imageZposition`) 上的标注轮廓.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    /// 该层的 z 坐标 (mm).
    pub z: f64,

    /// 轮廓顶点, `(h, w)`.
    pub polygon: Vec<Idx2d>,
}

/// 按编号索引的标注, 每个编号对应按 `z` 升序排列的若干层轮廓.
pub type NoduleMap = BTreeMap<String, Vec<Roi>>;

/// 一个目录下的全部标注.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoduleAnnotations {
    /// 结节 (`unblindedReadNodule`).
    pub cancer_nodules: NoduleMap,

    /// 非结节 (`nonNodule`).
    pub non_nodules: NoduleMap,
}

impl NoduleAnnotations {
    /// 是否没有任何标注.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cancer_nodules.is_empty() && self.non_nodules.is_empty()
    }
}

/// 读取标注时可能发生的错误.
#[derive(Debug)]
pub enum XmlError {
    /// 文件不是合法的 XML.
    Parse {
        /// 出错的文件.
        path: PathBuf,

        /// 具体原因.
        msg: String,
    },

    /// 缺少必需的子节点, 或节点内容无法解析.
    Malformed {
        /// 出错的文件.
        path: PathBuf,

        /// 具体原因.
        msg: String,
    },

    /// 其他底层 I/O 错误.
    IoError(std::io::Error),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { path, msg } => write!(f, "{}: {msg}", path.display()),
            Self::Malformed { path, msg } => {
                write!(f, "{}: malformed annotation, {msg}", path.display())
            }
            Self::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for XmlError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// 读取标注的结果.
pub type XmlResult<T> = Result<T, XmlError>;

/// 读取目录 `dir` 下所有 `.xml` 标注文件.
///
/// 文件按路径顺序读取; 编号重复时, 后读到的标注覆盖先读到的.
/// 目录中没有 `.xml` 文件时返回空结果.
pub fn read_xml_directory<P: AsRef<Path>>(dir: P) -> XmlResult<NoduleAnnotations> {
    let dir = dir.as_ref();
    let mut paths = vec![];
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |e| e == "xml") {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        warn!("no annotation file in {}", dir.display());
    }
    paths.sort();

    let mut ans = NoduleAnnotations::default();
    for path in paths {
        let text = std::fs::read_to_string(&path)?;
        let one = parse_annotations(&text).map_err(|e| e.at(&path))?;
        ans.cancer_nodules.extend(one.cancer_nodules);
        ans.non_nodules.extend(one.non_nodules);
    }
    debug!(
        "{}: {} nodules, {} non-nodules",
        dir.display(),
        ans.cancer_nodules.len(),
        ans.non_nodules.len()
    );
    Ok(ans)
}

/// 不带文件路径的解析错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// XML 语法错误.
    Syntax(String),

    /// 标注结构错误.
    Malformed(String),
}

impl ParseError {
    fn at(self, path: &Path) -> XmlError {
        let path = path.to_owned();
        match self {
            Self::Syntax(msg) => XmlError::Parse { path, msg },
            Self::Malformed(msg) => XmlError::Malformed { path, msg },
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(msg) | Self::Malformed(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// 解析一份标注文档.
pub fn parse_annotations(text: &str) -> Result<NoduleAnnotations, ParseError> {
    let doc = Document::parse(text).map_err(|e| ParseError::Syntax(e.to_string()))?;
    let mut ans = NoduleAnnotations::default();
    for session in doc.root_element().children().filter(Node::is_element) {
        for node in session.children().filter(Node::is_element) {
            if node.has_tag_name((NIH_NS, "unblindedReadNodule")) {
                let (id, rois) = nodule_rois(node)?;
                ans.cancer_nodules.insert(id, rois);
            } else if node.has_tag_name((NIH_NS, "nonNodule")) {
                let (id, roi) = non_nodule_roi(node)?;
                ans.non_nodules.insert(id, vec![roi]);
            }
        }
    }
    Ok(ans)
}

fn nodule_rois(node: Node) -> Result<(String, Vec<Roi>), ParseError> {
    let id = child_text(node, "noduleID")?.to_string();
    let mut rois: Vec<Roi> = vec![];
    for roi in children(node, "roi") {
        let z = parse_z(roi)?;
        let polygon = children(roi, "edgeMap")
            .map(vertex)
            .collect::<Result<Vec<_>, _>>()?;
        // 同一层出现多次时保留最后一次.
        rois.retain(|r| r.z != z);
        rois.push(Roi { z, polygon });
    }
    rois.sort_by(|a, b| a.z.total_cmp(&b.z));
    Ok((id, rois))
}

fn non_nodule_roi(node: Node) -> Result<(String, Roi), ParseError> {
    let id = child_text(node, "nonNoduleID")?.to_string();
    let z = parse_z(node)?;
    let polygon = children(node, "locus")
        .map(vertex)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((id, Roi { z, polygon }))
}

#[inline]
fn children<'a, 'i>(node: Node<'a, 'i>, name: &'static str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| n.has_tag_name((NIH_NS, name)))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ParseError> {
    node.children()
        .find(|n| n.has_tag_name((NIH_NS, name)))
        .and_then(|n| n.text())
        .map(str::trim)
        .ok_or_else(|| {
            ParseError::Malformed(format!(
                "<{}> without <{name}> at byte {}",
                node.tag_name().name(),
                node.range().start
            ))
        })
}

fn parse_z(node: Node) -> Result<f64, ParseError> {
    let text = child_text(node, "imageZposition")?;
    text.parse()
        .map_err(|_| ParseError::Malformed(format!("bad imageZposition `{text}`")))
}

/// 读取一个顶点 (`xCoord`, `yCoord`), 返回 `(h, w)`.
fn vertex(node: Node) -> Result<Idx2d, ParseError> {
    let coord = |name: &str| {
        let text = child_text(node, name)?;
        text.parse::<usize>()
            .map_err(|_| ParseError::Malformed(format!("bad {name} `{text}`")))
    };
    let (x, y) = (coord("xCoord")?, coord("yCoord")?);
    Ok((y, x))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIDC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LidcReadMessage xmlns="http://www.nih.gov" uid="1.3.6.1.4.1.14519.5.2.1.6279.6001.1">
  <ResponseHeader>
    <StudyInstanceUid>1.3.6.1.4.1.14519.5.2.1.6279.6001.2</StudyInstanceUid>
  </ResponseHeader>
  <readingSession>
    <servicingRadiologistID>anon</servicingRadiologistID>
    <unblindedReadNodule>
      <noduleID>Nodule 001</noduleID>
      <roi>
        <imageZposition>-120.5</imageZposition>
        <inclusion>TRUE</inclusion>
        <edgeMap><xCoord>310</xCoord><yCoord>240</yCoord></edgeMap>
        <edgeMap><xCoord>311</xCoord><yCoord>241</yCoord></edgeMap>
        <edgeMap><xCoord>310</xCoord><yCoord>242</yCoord></edgeMap>
      </roi>
      <roi>
        <imageZposition>-125.0</imageZposition>
        <inclusion>TRUE</inclusion>
        <edgeMap><xCoord>312</xCoord><yCoord>239</yCoord></edgeMap>
      </roi>
    </unblindedReadNodule>
    <nonNodule>
      <nonNoduleID>Non-nodule 002</nonNoduleID>
      <imageZposition>-90</imageZposition>
      <locus><xCoord>100</xCoord><yCoord>200</yCoord></locus>
    </nonNodule>
  </readingSession>
  <readingSession>
    <unblindedReadNodule>
      <noduleID> IL057_127364 </noduleID>
      <roi>
        <imageZposition>-100</imageZposition>
        <edgeMap><xCoord>50</xCoord><yCoord>60</yCoord></edgeMap>
      </roi>
    </unblindedReadNodule>
  </readingSession>
</LidcReadMessage>
"#;

    #[test]
    fn test_parse_lidc() {
        let ans = parse_annotations(LIDC).unwrap();
        assert!(!ans.is_empty());
        assert_eq!(ans.cancer_nodules.len(), 2);
        assert_eq!(ans.non_nodules.len(), 1);

        let rois = &ans.cancer_nodules["Nodule 001"];
        assert_eq!(rois.len(), 2);
        assert_eq!(rois[0].z, -125.0);
        assert_eq!(rois[0].polygon, [(239, 312)]);
        assert_eq!(rois[1].z, -120.5);
        assert_eq!(rois[1].polygon, [(240, 310), (241, 311), (242, 310)]);

        assert_eq!(ans.cancer_nodules["IL057_127364"][0].polygon, [(60, 50)]);

        let non = &ans.non_nodules["Non-nodule 002"];
        assert_eq!(
            non,
            &[Roi {
                z: -90.0,
                polygon: vec![(200, 100)]
            }]
        );
    }

    #[test]
    fn test_foreign_namespace_ignored() {
        let text = r#"<root xmlns="http://example.org"><s><nonNodule>
            <nonNoduleID>x</nonNoduleID><imageZposition>1</imageZposition>
        </nonNodule></s></root>"#;
        assert!(parse_annotations(text).unwrap().is_empty());
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse_annotations("<a><b>"), Err(ParseError::Syntax(_))));

        let no_id = r#"<r xmlns="http://www.nih.gov"><s><unblindedReadNodule>
            <roi><imageZposition>1</imageZposition></roi>
        </unblindedReadNodule></s></r>"#;
        assert!(matches!(parse_annotations(no_id), Err(ParseError::Malformed(_))));

        let bad_coord = r#"<r xmlns="http://www.nih.gov"><s><nonNodule>
            <nonNoduleID>n</nonNoduleID><imageZposition>1</imageZposition>
            <locus><xCoord>-3</xCoord><yCoord>4</yCoord></locus>
        </nonNodule></s></r>"#;
        assert!(matches!(parse_annotations(bad_coord), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_read_directory() {
        let dir = std::env::temp_dir().join(format!("lung-berry-xml-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(read_xml_directory(&dir).unwrap().is_empty());

        std::fs::write(dir.join("069.xml"), LIDC).unwrap();
        std::fs::write(dir.join("000001.dcm"), b"skipped").unwrap();
        let ans = read_xml_directory(&dir).unwrap();
        assert_eq!(ans, parse_annotations(LIDC).unwrap());

        std::fs::write(dir.join("070.xml"), "<broken").unwrap();
        assert!(matches!(read_xml_directory(&dir), Err(XmlError::Parse { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
