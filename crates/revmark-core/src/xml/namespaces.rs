#![allow(non_snake_case)]

use super::xname::XName;

pub mod W {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub fn document() -> XName { XName::new(NS, "document") }
    pub fn body() -> XName { XName::new(NS, "body") }
    pub fn p() -> XName { XName::new(NS, "p") }
    pub fn pPr() -> XName { XName::new(NS, "pPr") }
    pub fn r() -> XName { XName::new(NS, "r") }
    pub fn rPr() -> XName { XName::new(NS, "rPr") }
    pub fn t() -> XName { XName::new(NS, "t") }
    pub fn delText() -> XName { XName::new(NS, "delText") }
    pub fn instrText() -> XName { XName::new(NS, "instrText") }
    pub fn delInstrText() -> XName { XName::new(NS, "delInstrText") }
    pub fn ins() -> XName { XName::new(NS, "ins") }
    pub fn del() -> XName { XName::new(NS, "del") }
    pub fn tbl() -> XName { XName::new(NS, "tbl") }
    pub fn tblPr() -> XName { XName::new(NS, "tblPr") }
    pub fn tblGrid() -> XName { XName::new(NS, "tblGrid") }
    pub fn gridCol() -> XName { XName::new(NS, "gridCol") }
    pub fn tr() -> XName { XName::new(NS, "tr") }
    pub fn trPr() -> XName { XName::new(NS, "trPr") }
    pub fn trPrChange() -> XName { XName::new(NS, "trPrChange") }
    pub fn tc() -> XName { XName::new(NS, "tc") }
    pub fn tcPr() -> XName { XName::new(NS, "tcPr") }
    pub fn sectPr() -> XName { XName::new(NS, "sectPr") }
    pub fn pPrChange() -> XName { XName::new(NS, "pPrChange") }
    pub fn txbxContent() -> XName { XName::new(NS, "txbxContent") }
    pub fn hyperlink() -> XName { XName::new(NS, "hyperlink") }
    pub fn footnotes() -> XName { XName::new(NS, "footnotes") }
    pub fn footnote() -> XName { XName::new(NS, "footnote") }
    pub fn endnotes() -> XName { XName::new(NS, "endnotes") }
    pub fn endnote() -> XName { XName::new(NS, "endnote") }
    pub fn footnoteReference() -> XName { XName::new(NS, "footnoteReference") }
    pub fn endnoteReference() -> XName { XName::new(NS, "endnoteReference") }
    pub fn tab() -> XName { XName::new(NS, "tab") }
    pub fn br() -> XName { XName::new(NS, "br") }
    pub fn cr() -> XName { XName::new(NS, "cr") }
    pub fn id() -> XName { XName::new(NS, "id") }
    pub fn author() -> XName { XName::new(NS, "author") }
    pub fn date() -> XName { XName::new(NS, "date") }
    pub fn val() -> XName { XName::new(NS, "val") }
    pub fn type_() -> XName { XName::new(NS, "type") }
}

pub mod R {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    pub fn id() -> XName { XName::new(NS, "id") }
    pub fn embed() -> XName { XName::new(NS, "embed") }
}

pub mod M {
    pub const NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
}

pub mod V {
    pub const NS: &str = "urn:schemas-microsoft-com:vml";
}

pub mod O {
    use super::XName;
    pub const NS: &str = "urn:schemas-microsoft-com:office:office";

    pub fn relid() -> XName { XName::new(NS, "relid") }
}

pub mod W10 {
    pub const NS: &str = "urn:schemas-microsoft-com:office:word";
}

pub mod W14 {
    pub const NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
}

pub mod WP {
    pub const NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
}

pub mod MC {
    pub const NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
}

pub mod XML {
    use super::XName;
    pub const NS: &str = "http://www.w3.org/XML/1998/namespace";

    pub fn space() -> XName { XName::new(NS, "space") }
}

pub mod XMLNS {
    pub const NS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespaces of the package layer (content types, relationships, core properties).
pub mod PKG {
    use super::XName;
    pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CORE_PROPERTIES_NS: &str =
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

    pub fn types() -> XName { XName::new(CONTENT_TYPES_NS, "Types") }
    pub fn default() -> XName { XName::new(CONTENT_TYPES_NS, "Default") }
    pub fn override_() -> XName { XName::new(CONTENT_TYPES_NS, "Override") }
    pub fn relationships() -> XName { XName::new(RELATIONSHIPS_NS, "Relationships") }
    pub fn relationship() -> XName { XName::new(RELATIONSHIPS_NS, "Relationship") }
    pub fn last_modified_by() -> XName { XName::new(CORE_PROPERTIES_NS, "lastModifiedBy") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_namespace_creates_valid_xnames() {
        let p = W::p();
        assert_eq!(p.namespace, Some(W::NS.to_string()));
        assert_eq!(p.local_name, "p");
    }

    #[test]
    fn keyword_names_are_escaped() {
        assert_eq!(W::type_().local_name, "type");
        assert_eq!(PKG::override_().local_name, "Override");
    }
}
