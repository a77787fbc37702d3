//! Runtime bridge between the UI command queue and the backend
//! collaborators. Hosts a tokio runtime on a dedicated worker thread and
//! converts every command outcome into a `UiEvent`; nothing here touches
//! view state.

use std::thread;

use client_core::{DocumentSource, ExtractionClient, HttpDocumentSource, PageRaster};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{PageImage, UiError, UiErrorContext, UiEvent};
use crate::controller::viewport::scale_key;

pub fn launch(backend_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let extraction = match ExtractionClient::new(&backend_url) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    tracing::error!("invalid backend url: {err}");
                    return;
                }
            };
            let source = match HttpDocumentSource::new(&backend_url) {
                Ok(source) => source,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    tracing::error!("invalid backend url: {err}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::ListDocuments => {
                        tracing::info!("backend: list_documents");
                        match extraction.list_documents().await {
                            Ok(documents) => {
                                let _ = ui_tx.try_send(UiEvent::DocumentListLoaded(documents));
                            }
                            Err(err) => {
                                tracing::error!("backend: list_documents failed: {err}");
                                let _ = ui_tx.try_send(UiEvent::DocumentListFailed(
                                    UiError::from_client_error(UiErrorContext::ListDocuments, &err),
                                ));
                            }
                        }
                    }
                    BackendCommand::FetchExtraction { document_id } => {
                        tracing::info!(document = %document_id, "backend: fetch_extraction");
                        match extraction.fetch_extraction(&document_id).await {
                            Ok(document) => {
                                let _ = ui_tx.try_send(UiEvent::ExtractionLoaded {
                                    document_id,
                                    document,
                                });
                            }
                            Err(err) => {
                                tracing::error!(
                                    document = %document_id,
                                    "backend: fetch_extraction failed: {err}"
                                );
                                let error = UiError::from_client_error(
                                    UiErrorContext::FetchExtraction,
                                    &err,
                                );
                                let _ =
                                    ui_tx.try_send(UiEvent::ExtractionFailed { document_id, error });
                            }
                        }
                    }
                    BackendCommand::OpenDocument { document_id } => {
                        tracing::info!(document = %document_id, "backend: open_document");
                        match source.page_count(&document_id).await {
                            Ok(count) => {
                                let _ = ui_tx.try_send(UiEvent::PageCountResolved {
                                    document_id,
                                    count,
                                });
                            }
                            Err(err) => {
                                tracing::error!(
                                    document = %document_id,
                                    "backend: open_document failed: {err}"
                                );
                                let error =
                                    UiError::from_client_error(UiErrorContext::LoadDocument, &err);
                                let _ = ui_tx
                                    .try_send(UiEvent::DocumentLoadFailed { document_id, error });
                            }
                        }
                    }
                    BackendCommand::RenderPage {
                        document_id,
                        page_number,
                        scale,
                    } => {
                        tracing::info!(
                            document = %document_id,
                            page_number,
                            scale,
                            "backend: render_page"
                        );
                        match source.render_page(&document_id, page_number, scale).await {
                            Ok(raster) => match decode_page_image(&raster) {
                                Ok(image) => {
                                    let _ = ui_tx.try_send(UiEvent::PageRendered {
                                        document_id,
                                        page_number,
                                        scale_key: scale_key(scale),
                                        image,
                                    });
                                }
                                Err(reason) => {
                                    tracing::warn!(
                                        document = %document_id,
                                        page_number,
                                        "page raster decode failed: {reason}"
                                    );
                                    let _ = ui_tx.try_send(UiEvent::PageRenderFailed {
                                        document_id,
                                        page_number,
                                        reason,
                                    });
                                }
                            },
                            Err(err) => {
                                tracing::error!(
                                    document = %document_id,
                                    page_number,
                                    "backend: render_page failed: {err}"
                                );
                                let _ = ui_tx.try_send(UiEvent::PageRenderFailed {
                                    document_id,
                                    page_number,
                                    reason: err.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        });
    });
}

fn decode_page_image(raster: &PageRaster) -> Result<PageImage, String> {
    let decoded = image::load_from_memory(&raster.bytes)
        .map_err(|err| format!("failed to decode page raster: {err}"))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PageImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_png_raster_into_rgba_pixels() {
        // 1x1 opaque red PNG.
        let mut png = Vec::new();
        {
            let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
            image::DynamicImage::ImageRgba8(image)
                .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
                .expect("encode png");
        }
        let raster = PageRaster {
            page_number: 1,
            bytes: png,
        };

        let decoded = decode_page_image(&raster).expect("decode");
        assert_eq!((decoded.width, decoded.height), (1, 1));
        assert_eq!(decoded.rgba, vec![255, 0, 0, 255]);
    }

    #[test]
    fn garbage_bytes_fail_decoding_with_a_reason() {
        let raster = PageRaster {
            page_number: 1,
            bytes: vec![0, 1, 2, 3],
        };
        let err = decode_page_image(&raster).expect_err("must fail");
        assert!(err.contains("failed to decode page raster"));
    }
}
