//! File picker reads and download saves.

#[cfg(feature = "hydrate")]
use chat::types::UploadFile;

/// Read every file selected in `input` into memory.
#[cfg(feature = "hydrate")]
pub async fn read_selected(input: &web_sys::HtmlInputElement) -> Vec<UploadFile> {
    let Some(list) = input.files() else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for index in 0..list.length() {
        let Some(file) = list.get(index) else {
            continue;
        };
        let buffer = match wasm_bindgen_futures::JsFuture::from(file.array_buffer()).await {
            Ok(buffer) => buffer,
            Err(e) => {
                leptos::logging::warn!("could not read {}: {e:?}", file.name());
                continue;
            }
        };
        let mime = file.type_();
        files.push(UploadFile {
            name: file.name(),
            bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
            mime: (!mime.is_empty()).then_some(mime),
        });
    }
    files
}

/// Hand `bytes` to the browser as a download named `file_name`.
pub fn save_bytes(file_name: &str, bytes: &[u8]) {
    #[cfg(feature = "hydrate")]
    {
        use wasm_bindgen::JsCast;

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let Ok(blob) = web_sys::Blob::new_with_u8_array_sequence(&parts) else {
            return;
        };
        let Ok(url) = web_sys::Url::create_object_url_with_blob(&blob) else {
            return;
        };
        if let Some(anchor) = document
            .create_element("a")
            .ok()
            .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok())
        {
            anchor.set_href(&url);
            anchor.set_download(file_name);
            anchor.click();
        }
        let _ = web_sys::Url::revoke_object_url(&url);
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (file_name, bytes);
    }
}
