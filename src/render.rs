//! Static HTML page: a thumbnail grid with an in-page modal player.
//!
//! [`render_page`] is a pure function of its inputs. [`write_page`] replaces
//! the output file atomically so a failed build never leaves half a page.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Error;
use crate::filter::FilteredVideo;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
"#;

const PAGE_STYLE: &str = r#"<style>
  body { margin:0; font-family:Arial, sans-serif; background:#f4f4f4; }

  .gallery {
    display:grid;
    grid-template-columns:repeat(auto-fill,minmax(250px,1fr));
    gap:20px;
    padding:20px;
  }

  .gallery-item {
    background:#59798E;
    border-radius:8px;
    overflow:hidden;
    box-shadow: 0 4px 8px rgba(0,0,0,0.10);
    transition: transform 0.2s ease, background-color 0.2s ease;
    padding:0;
    border:0;
    cursor:pointer;
    text-align:left;
  }

  .gallery-item:hover { transform: translateY(-3px); background:#ccc; }

  /* 16:9 box, image cropped to fill */
  .thumb {
    position: relative;
    width: 100%;
    padding-top: 56.25%;
    background: #2d3b44;
  }
  .thumb img {
    position: absolute;
    inset: 0;
    width: 100%;
    height: 100%;
    object-fit: cover;
    display: block;
  }

  .gallery-item p { margin:0; padding:10px; color:white; }
  .gallery-item:hover p { color:#333; }

  .empty { padding: 24px; text-align:center; color:#333; }

  .modal {
    position: fixed;
    inset: 0;
    background: rgba(0,0,0,0.70);
    display: none;
    align-items: center;
    justify-content: center;
    padding: 18px;
    z-index: 9999;
  }
  .modal.open { display: flex; }

  .modal-card {
    width: min(980px, 100%);
    background: #111;
    border-radius: 12px;
    overflow: hidden;
    box-shadow: 0 12px 40px rgba(0,0,0,0.35);
  }

  .modal-header {
    display:flex;
    align-items:center;
    justify-content: space-between;
    gap: 12px;
    padding: 10px 12px;
    background: #59798E;
    color: #fff;
  }

  .modal-title {
    font-size: 14px;
    line-height: 1.3;
    margin: 0;
    padding: 0;
    flex: 1;
  }

  .btn {
    appearance: none;
    border: 0;
    border-radius: 10px;
    padding: 8px 12px;
    background: #fff;
    color: #59798E;
    cursor: pointer;
    font-size: 13px;
    font-weight: 700;
  }
  .btn:hover { background: #f1f1f1; }

  .player-wrap {
    position: relative;
    width: 100%;
    padding-top: 56.25%;
    background: #000;
  }

  .player-wrap iframe {
    position:absolute;
    inset:0;
    width:100%;
    height:100%;
    border:0;
  }
</style>
</head>
<body>

  <div class="gallery">
"#;

const EMPTY_STATE: &str = r#"
    <div class="empty">
      <p>No videos found.</p>
    </div>
"#;

const PAGE_TAIL: &str = r#"  </div>

  <div class="modal" id="modal" aria-hidden="true">
    <div class="modal-card" role="dialog" aria-modal="true" aria-label="Video player">
      <div class="modal-header">
        <p class="modal-title" id="modalTitle">Playing…</p>
        <button class="btn" id="closeBtn" type="button">Close</button>
      </div>
      <div class="player-wrap">
        <iframe
          id="player"
          src=""
          allow="autoplay; encrypted-media; picture-in-picture"
          allowfullscreen
        ></iframe>
      </div>
    </div>
  </div>

<script>
  const modal = document.getElementById("modal");
  const player = document.getElementById("player");
  const modalTitle = document.getElementById("modalTitle");
  const closeBtn = document.getElementById("closeBtn");

  function openVideo(videoId, title) {
    // vq is only a hint; muted autoplay is the reliable variant.
    const embed =
      "https://www.youtube-nocookie.com/embed/" + encodeURIComponent(videoId) +
      "?autoplay=1&mute=1&rel=0&playsinline=1&vq=hd1080";

    player.src = embed;
    modalTitle.textContent = title || "Playing…";

    modal.classList.add("open");
    modal.setAttribute("aria-hidden", "false");
  }

  function closeModal() {
    modal.classList.remove("open");
    modal.setAttribute("aria-hidden", "true");
    player.src = "";
  }

  document.addEventListener("click", (e) => {
    const btn = e.target.closest(".gallery-item[data-video-id]");
    if (!btn) return;
    openVideo(btn.getAttribute("data-video-id"), btn.getAttribute("data-title") || "Video");
  });

  closeBtn.addEventListener("click", closeModal);

  modal.addEventListener("click", (e) => {
    if (e.target === modal) closeModal();
  });

  document.addEventListener("keydown", (e) => {
    if (e.key === "Escape") closeModal();
  });
</script>

</body>
</html>
"#;

/// Escapes the five characters that matter in HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn render_item(out: &mut String, entry: &FilteredVideo) {
    let id = escape_html(&entry.video.video_id);
    let title = escape_html(&entry.video.title);
    let thumb = escape_html(&entry.video.thumbnail_url);
    out.push_str(&format!(
        r#"
    <button class="gallery-item" type="button" data-video-id="{id}" data-title="{title}">
      <div class="thumb">
        <img src="{thumb}" alt="{title}" loading="lazy">
      </div>
      <p>{title}</p>
    </button>
"#
    ));
}

/// Renders the full document for `videos` in the given order.
pub fn render_page(videos: &[FilteredVideo], page_title: &str) -> String {
    let mut html = String::with_capacity(8 * 1024 + videos.len() * 512);
    html.push_str(PAGE_HEAD);
    html.push_str(&format!("<title>{}</title>\n", escape_html(page_title)));
    html.push_str(PAGE_STYLE);
    if videos.is_empty() {
        html.push_str(EMPTY_STATE);
    } else {
        for entry in videos {
            render_item(&mut html, entry);
        }
    }
    html.push_str(PAGE_TAIL);
    html
}

/// Mode for a page written where none existed yet.
#[cfg(unix)]
const NEW_PAGE_MODE: u32 = 0o644;

/// Temp files are created 0600; the published page keeps the mode of the file
/// it replaces, or [`NEW_PAGE_MODE`] when there was none.
#[cfg(unix)]
fn set_page_mode(staged: &NamedTempFile, target: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match fs::metadata(target) {
        Ok(existing) => existing.permissions().mode() & 0o7777,
        Err(err) if err.kind() == io::ErrorKind::NotFound => NEW_PAGE_MODE,
        Err(err) => return Err(err),
    };
    staged
        .as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_page_mode(_staged: &NamedTempFile, _target: &Path) -> io::Result<()> {
    Ok(())
}

/// Writes `html` to `path`, creating parent directories and replacing any
/// previous file in one rename.
pub fn write_page(path: &Path, html: &str) -> Result<(), Error> {
    let output_error = |source| Error::Output {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(output_error)?;

    let mut staged = NamedTempFile::new_in(&dir).map_err(output_error)?;
    staged.write_all(html.as_bytes()).map_err(output_error)?;
    staged.flush().map_err(output_error)?;
    set_page_mode(&staged, path).map_err(output_error)?;
    staged
        .persist(path)
        .map_err(|err| output_error(err.error))?;

    info!(path = %path.display(), bytes = html.len(), "wrote gallery page");
    Ok(())
}
