use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{CursorPage, PageRequest};

const CURSOR_PREFIX: &str = "offset:";

/// Encodes a listing offset as an opaque page token.
pub(crate) fn encode_offset(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

/// Decodes a page token produced by [`encode_offset`].
pub(crate) fn decode_offset(token: &str) -> AppResult<usize> {
    let invalid = || AppError::Validation(format!("page token '{token}' is invalid"));
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;
    decoded
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse::<usize>().ok())
        .ok_or_else(invalid)
}

/// Cuts one page out of an already filtered and sorted listing.
pub(crate) fn paginate<T>(items: Vec<T>, page: &PageRequest) -> AppResult<CursorPage<T>> {
    let offset = match page.page_token.as_deref() {
        Some(token) => decode_offset(token)?,
        None => 0,
    };
    let page_size = page.page_size.max(1);
    let end = offset.saturating_add(page_size);
    let next_page_token = (end < items.len()).then(|| encode_offset(end));

    Ok(CursorPage::new(
        items.into_iter().skip(offset).take(page_size).collect(),
        next_page_token,
    ))
}
