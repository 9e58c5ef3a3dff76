//! LibXML2 FFI wrapper for XSD compilation and instance validation.
//!
//! No mature pure-Rust XSD validator exists, so structural validation goes through
//! libxml2 directly. Documents are parsed with `roxmltree` elsewhere; libxml2 only
//! ever sees the schema files and the raw instance bytes handed to
//! [`LibXml2Wrapper::validate_memory`].
//!
//! ## Thread safety
//!
//! - Initialization runs exactly once behind a [`Once`].
//! - Schema *parsing* is not thread-safe in libxml2. The schema registry compiles each
//!   version at most once, behind its single-flight cache.
//! - Compiled schemas are read-only and may be shared; every validation creates its
//!   own validation context, so concurrent validations need no lock.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Once};

use libc::{c_char, c_int};

use crate::error::{LibXml2Error, LibXml2Result};

static LIBXML2_INIT: Once = Once::new();

/// Forbid network access while parsing.
const XML_PARSE_NONET: c_int = 1 << 11;

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();

    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    pub fn xmlSchemaNewDocParserCtxt(doc: *mut XmlDoc) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut libc::c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut libc::c_void,
    );
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut libc::c_void,
    pub node: *mut libc::c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut libc::c_void, error: *mut xmlError)>;

/// One diagnostic reported by libxml2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlIssue {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub domain: i32,
    pub code: i32,
    /// 1 = warning, 2 = error, 3 = fatal
    pub level: i32,
}

unsafe extern "C" fn structured_error_callback(user_data: *mut libc::c_void, error: *mut xmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let issues = unsafe { &mut *(user_data as *mut Vec<XmlIssue>) };
    let error = unsafe { &*error };

    let message = if error.message.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .trim()
            .to_string()
    };

    issues.push(XmlIssue {
        line: error.line.max(0) as u32,
        column: error.int2.max(0) as u32,
        message,
        domain: error.domain,
        code: error.code,
        level: error.level,
    });
}

/// Shared handle to a compiled schema.
#[derive(Debug, Clone)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    /// Source document the schema was compiled from; outlives the schema.
    doc: *mut XmlDoc,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: compiled xmlSchema structures are read-only after parsing.
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and `doc` (if non-null) must be the
    /// document it was compiled from. Both become owned by the returned handle.
    unsafe fn from_raw(ptr: *mut XmlSchema, doc: *mut XmlDoc) -> LibXml2Result<Self> {
        if ptr.is_null() {
            if !doc.is_null() {
                unsafe { xmlFreeDoc(doc) };
            }
            return Err(LibXml2Error::SchemaParseFailed);
        }

        Ok(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                doc,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

    pub fn is_valid(&self) -> bool {
        !self.inner.ptr.is_null()
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        unsafe {
            if !self.ptr.is_null() {
                xmlSchemaFree(self.ptr);
                self.ptr = std::ptr::null_mut();
            }
            if !self.doc.is_null() {
                xmlFreeDoc(self.doc);
                self.doc = std::ptr::null_mut();
            }
        }
    }
}

/// Outcome of validating one instance document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid {
        error_count: i32,
        issues: Vec<XmlIssue>,
    },
    InternalError {
        code: i32,
    },
}

impl ValidationResult {
    pub fn from_code(code: c_int, issues: Vec<XmlIssue>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                issues,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Issues reported during validation; empty for valid documents.
    pub fn issues(&self) -> &[XmlIssue] {
        match self {
            ValidationResult::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}

/// Safe entry point to libxml2.
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Compiles schema text as if it were located at `base`, so that relative
    /// `schemaLocation` imports resolve against the file's directory.
    ///
    /// Returns the compiled schema, or the parser diagnostics on failure.
    pub fn parse_schema_with_base(
        &self,
        schema_data: &[u8],
        base: &Path,
    ) -> Result<XmlSchemaPtr, Vec<XmlIssue>> {
        let failure = |message: &str| {
            vec![XmlIssue {
                line: 0,
                column: 0,
                message: message.to_string(),
                domain: 0,
                code: 0,
                level: 3,
            }]
        };

        if schema_data.is_empty() {
            return Err(failure("schema document is empty"));
        }
        let base_url = base
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| failure("schema path is not valid UTF-8"))?;

        unsafe {
            let doc = xmlReadMemory(
                schema_data.as_ptr() as *const c_char,
                schema_data.len() as c_int,
                base_url.as_ptr(),
                std::ptr::null(),
                XML_PARSE_NONET,
            );
            if doc.is_null() {
                return Err(failure("schema document is not well-formed XML"));
            }

            let parser_ctxt = xmlSchemaNewDocParserCtxt(doc);
            if parser_ctxt.is_null() {
                xmlFreeDoc(doc);
                return Err(failure("could not allocate schema parser context"));
            }

            let mut issues: Vec<XmlIssue> = Vec::new();
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                &mut issues as *mut Vec<XmlIssue> as *mut libc::c_void,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            XmlSchemaPtr::from_raw(schema_ptr, doc).map_err(|_| {
                if issues.is_empty() {
                    failure("schema compilation failed")
                } else {
                    issues
                }
            })
        }
    }

    /// Validates in-memory XML against a compiled schema.
    ///
    /// Safe to call concurrently; each call owns its validation context and document.
    pub fn validate_memory(
        &self,
        schema: &XmlSchemaPtr,
        xml_content: &[u8],
        document_name: &str,
    ) -> LibXml2Result<ValidationResult> {
        let name = CString::new(document_name).map_err(|_| LibXml2Error::DocumentParseFailed)?;

        unsafe {
            let doc = xmlReadMemory(
                xml_content.as_ptr() as *const c_char,
                xml_content.len() as c_int,
                name.as_ptr(),
                std::ptr::null(),
                XML_PARSE_NONET,
            );
            if doc.is_null() {
                return Err(LibXml2Error::DocumentParseFailed);
            }

            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                xmlFreeDoc(doc);
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut issues: Vec<XmlIssue> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                &mut issues as *mut Vec<XmlIssue> as *mut libc::c_void,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt, doc);

            xmlSchemaFreeValidCtxt(valid_ctxt);
            xmlFreeDoc(doc);

            Ok(ValidationResult::from_code(result_code, issues))
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}
