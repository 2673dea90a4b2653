//! Smooth Unicode progress bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_LOADING, C_MUTED, C_SECONDARY, C_SUCCESS};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render a bar for `percent` (0..=100) followed by the rounded percentage.
pub fn draw_progress(frame: &mut Frame, area: Rect, percent: f64) {
    if area.width < 8 || area.height == 0 {
        return;
    }

    let label = format!(" {:>3}%", percent.clamp(0.0, 100.0).floor() as u16);
    let bar_w = area.width.saturating_sub(label.len() as u16).max(4) as usize;
    let bar = bar_cells(percent, bar_w);
    let color = if percent >= 100.0 { C_SUCCESS } else { C_LOADING };

    let spans = vec![
        Span::styled(bar, Style::default().fg(color).bg(C_MUTED)),
        Span::styled(label, Style::default().fg(C_SECONDARY)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Eighth-cell fill for `percent` across `width` cells.
fn bar_cells(percent: f64, width: usize) -> String {
    let eighths = (percent.clamp(0.0, 100.0) / 100.0 * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full_blocks.min(width) {
        bar.push('█');
    }
    if full_blocks < width {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_matches_percentage() {
        assert_eq!(bar_cells(0.0, 4), "    ");
        assert_eq!(bar_cells(50.0, 4), "██  ");
        assert_eq!(bar_cells(100.0, 4), "████");
        assert_eq!(bar_cells(12.5, 4).chars().next(), Some('▌'));
        assert_eq!(bar_cells(250.0, 4).chars().count(), 4);
    }
}
