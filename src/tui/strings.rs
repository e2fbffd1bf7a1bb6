//! Built-in UI text.
//!
//! The core only hands out opaque keys (`QUALITY_GOOD`, `ALERT_HIGH_LOSS`, ...).
//! Lookup falls back to English, then to the key itself. Templates use
//! `{name}` placeholders filled by [`tr_fmt`].

use crate::prefs::Language;

const EN: &[(&str, &str)] = &[
    ("CONTROLS_HINT", "Press k to see all keys"),
    ("STATUS_LABEL", "Status"),
    ("STATUS_MONITORING", "Monitoring"),
    ("STATUS_PAUSED", "Paused"),
    ("STATUS_PROBE_UNAVAILABLE", "ping unavailable"),
    ("PING_NOW_LABEL", "Ping now"),
    ("PING_NOW_VALUE", "{ms} ms"),
    ("PING_NOW_VALUE_TIMEOUT", "timeout"),
    ("PING_NOW_VALUE_ERROR", "error ({error})"),
    ("PING_NOW_VALUE_WAIT", "waiting..."),
    ("QUALITY_LABEL", "Quality"),
    ("QUALITY_UNKNOWN", "Unknown"),
    ("QUALITY_EXCELLENT", "Excellent"),
    ("QUALITY_GOOD", "Good"),
    ("QUALITY_FAIR", "Fair"),
    ("QUALITY_POOR", "Poor"),
    ("QUALITY_UNKNOWN_REASON", "Not enough data yet"),
    ("QUALITY_WARMING_UP_REASON", "Collecting more checks before rating"),
    ("QUALITY_NO_REPLY_REASON", "No replies received in the current window"),
    ("QUALITY_EXCELLENT_REASON", "Very low loss, low latency and stable timing"),
    ("QUALITY_GOOD_REASON", "Small loss and moderate latency"),
    ("QUALITY_FAIR_REASON", "Noticeable loss or higher latency"),
    ("QUALITY_POOR_REASON", "High loss or very high latency"),
    ("WINDOW_LABEL", "Window"),
    ("WINDOW_VALUE", "last {checks} checks"),
    ("METRIC_LABEL", "Metric"),
    ("METRIC_WINDOW", "Window"),
    ("METRIC_SESSION", "Session"),
    ("METRIC_LOSS_LABEL", "Loss"),
    ("METRIC_PING_LABEL", "Ping"),
    ("METRIC_JITTER_LABEL", "Jitter"),
    ("LOSS_VALUE", "{loss}% ({lost}/{count} lost)"),
    ("PING_VALUE", "{min} / {avg} / {max} ms"),
    ("JITTER_VALUE", "{jitter} ms"),
    ("VALUE_WAIT", "waiting for data..."),
    ("HISTORY_LABEL", "History"),
    ("ALERT_DELAY_SPIKE", "Delay spike in the last few checks"),
    ("ALERT_HIGH_LOSS", "High packet loss in the last few checks"),
    ("SHORT_LOSS_VALUE", "Short-term loss (last {count}): {loss}% ({lost} lost)"),
    ("SHORT_LOSS_WAIT", "Short-term loss: waiting for data..."),
    ("LONG_LOSS_VALUE", "Session loss ({count} checks): {loss}% ({lost} lost), {total} probes since start"),
    ("LONG_LOSS_WAIT", "Session loss: waiting for data..."),
    ("TRACE_LABEL", "Traceroute"),
    ("TRACE_IDLE", "not run yet (press t)"),
    ("TRACE_RUNNING", "running..."),
    ("TRACE_DONE", "finished"),
    ("TRACE_FAILED", "failed"),
    ("TRACE_CANCELLED", "stopped"),
    ("TRACE_UNAVAILABLE", "traceroute unavailable: {error}"),
    ("TRACE_TIMED_OUT", "gave up after the deadline"),
    ("TRACE_EXIT", "exited with code {code}"),
    ("TRACE_SUMMARY", "{hops} hops, {timeouts} without reply, max {max} ms"),
    ("TRACE_TIMEOUT_HOPS", "No reply from hops: {hops}"),
    ("TRACE_NO_TIMEOUTS", "Every hop replied"),
    ("TRACE_HINT", "f: full / summary, arrows: scroll"),
    ("TRACE_FULL", "full"),
    ("TRACE_SUMMARY_MODE", "summary"),
    ("KEYS_TITLE", " Keys "),
    ("KEY_ACTION_Q", "Quit"),
    ("KEY_ACTION_P", "Pause monitoring"),
    ("KEY_ACTION_R", "Resume monitoring"),
    ("KEY_ACTION_T", "Run traceroute"),
    ("KEY_ACTION_S", "Stop traceroute"),
    ("KEY_ACTION_F", "Full / summary traceroute"),
    ("KEY_ACTION_H", "Explain quality rating"),
    ("KEY_ACTION_K", "Show / hide this guide"),
    ("KEY_ACTION_L", "Switch language"),
    ("KEY_ACTION_WINDOW", "Grow / shrink window"),
    ("KEY_ACTION_X", "Reset session"),
    ("KEY_ACTION_E", "Export snapshot to JSON"),
    ("KEY_ACTION_C", "Cycle color theme"),
    ("KEY_ACTION_SCROLL", "Scroll traceroute"),
    ("KEYS_CLOSE", "Press any key to close"),
    ("MSG_PAUSED", "Monitoring paused"),
    ("MSG_RESUMED", "Monitoring resumed"),
    ("MSG_TRACE_STARTED", "Traceroute started"),
    ("MSG_TRACE_ALREADY_RUNNING", "Traceroute already running"),
    ("MSG_TRACE_STOPPED", "Traceroute stopped"),
    ("MSG_TRACE_NOT_RUNNING", "No traceroute running"),
    ("MSG_WINDOW", "Window: {checks} checks"),
    ("MSG_SESSION_RESET", "Session statistics reset"),
    ("MSG_EXPORTED", "Exported to {file}"),
    ("MSG_EXPORT_FAILED", "Export failed: {error}"),
    ("MSG_LANGUAGE", "Language: English"),
    ("MSG_THEME", "Theme: {theme}"),
];

const ID: &[(&str, &str)] = &[
    ("CONTROLS_HINT", "Tekan k untuk melihat semua tombol"),
    ("STATUS_LABEL", "Status"),
    ("STATUS_MONITORING", "Memantau"),
    ("STATUS_PAUSED", "Dijeda"),
    ("STATUS_PROBE_UNAVAILABLE", "ping tidak tersedia"),
    ("PING_NOW_LABEL", "Ping kini"),
    ("PING_NOW_VALUE_TIMEOUT", "habis waktu"),
    ("PING_NOW_VALUE_ERROR", "galat ({error})"),
    ("PING_NOW_VALUE_WAIT", "menunggu..."),
    ("QUALITY_LABEL", "Kualitas"),
    ("QUALITY_UNKNOWN", "Belum diketahui"),
    ("QUALITY_EXCELLENT", "Sangat baik"),
    ("QUALITY_GOOD", "Baik"),
    ("QUALITY_FAIR", "Cukup"),
    ("QUALITY_POOR", "Buruk"),
    ("QUALITY_UNKNOWN_REASON", "Data belum cukup"),
    ("QUALITY_WARMING_UP_REASON", "Mengumpulkan pengecekan sebelum menilai"),
    ("QUALITY_NO_REPLY_REASON", "Tidak ada balasan dalam jendela saat ini"),
    ("QUALITY_EXCELLENT_REASON", "Kehilangan sangat kecil, latensi rendah dan stabil"),
    ("QUALITY_GOOD_REASON", "Sedikit kehilangan dan latensi sedang"),
    ("QUALITY_FAIR_REASON", "Kehilangan terasa atau latensi lebih tinggi"),
    ("QUALITY_POOR_REASON", "Kehilangan tinggi atau latensi sangat tinggi"),
    ("WINDOW_LABEL", "Jendela"),
    ("WINDOW_VALUE", "{checks} cek terakhir"),
    ("METRIC_LABEL", "Metrik"),
    ("METRIC_WINDOW", "Jendela"),
    ("METRIC_SESSION", "Sesi"),
    ("METRIC_LOSS_LABEL", "Hilang"),
    ("LOSS_VALUE", "{loss}% ({lost}/{count} hilang)"),
    ("VALUE_WAIT", "menunggu data..."),
    ("HISTORY_LABEL", "Riwayat"),
    ("ALERT_DELAY_SPIKE", "Lonjakan latensi pada beberapa cek terakhir"),
    ("ALERT_HIGH_LOSS", "Kehilangan paket tinggi pada beberapa cek terakhir"),
    ("SHORT_LOSS_VALUE", "Kehilangan jangka pendek ({count} terakhir): {loss}% ({lost} hilang)"),
    ("SHORT_LOSS_WAIT", "Kehilangan jangka pendek: menunggu data..."),
    ("LONG_LOSS_VALUE", "Kehilangan sesi ({count} cek): {loss}% ({lost} hilang), {total} probe sejak mulai"),
    ("LONG_LOSS_WAIT", "Kehilangan sesi: menunggu data..."),
    ("TRACE_IDLE", "belum dijalankan (tekan t)"),
    ("TRACE_RUNNING", "berjalan..."),
    ("TRACE_DONE", "selesai"),
    ("TRACE_FAILED", "gagal"),
    ("TRACE_CANCELLED", "dihentikan"),
    ("TRACE_UNAVAILABLE", "traceroute tidak tersedia: {error}"),
    ("TRACE_TIMED_OUT", "dihentikan setelah batas waktu"),
    ("TRACE_EXIT", "keluar dengan kode {code}"),
    ("TRACE_SUMMARY", "{hops} hop, {timeouts} tanpa balasan, maks {max} ms"),
    ("TRACE_TIMEOUT_HOPS", "Tidak ada balasan dari hop: {hops}"),
    ("TRACE_NO_TIMEOUTS", "Semua hop membalas"),
    ("TRACE_HINT", "f: lengkap / ringkas, panah: gulir"),
    ("TRACE_FULL", "lengkap"),
    ("TRACE_SUMMARY_MODE", "ringkas"),
    ("KEYS_TITLE", " Tombol "),
    ("KEY_ACTION_Q", "Keluar"),
    ("KEY_ACTION_P", "Jeda pemantauan"),
    ("KEY_ACTION_R", "Lanjutkan pemantauan"),
    ("KEY_ACTION_T", "Jalankan traceroute"),
    ("KEY_ACTION_S", "Hentikan traceroute"),
    ("KEY_ACTION_F", "Traceroute lengkap / ringkas"),
    ("KEY_ACTION_H", "Jelaskan penilaian kualitas"),
    ("KEY_ACTION_K", "Tampilkan / sembunyikan panduan ini"),
    ("KEY_ACTION_L", "Ganti bahasa"),
    ("KEY_ACTION_WINDOW", "Perbesar / perkecil jendela"),
    ("KEY_ACTION_X", "Atur ulang sesi"),
    ("KEY_ACTION_E", "Ekspor cuplikan ke JSON"),
    ("KEY_ACTION_C", "Ganti tema warna"),
    ("KEY_ACTION_SCROLL", "Gulir traceroute"),
    ("KEYS_CLOSE", "Tekan tombol apa saja untuk menutup"),
    ("MSG_PAUSED", "Pemantauan dijeda"),
    ("MSG_RESUMED", "Pemantauan dilanjutkan"),
    ("MSG_TRACE_STARTED", "Traceroute dimulai"),
    ("MSG_TRACE_ALREADY_RUNNING", "Traceroute sedang berjalan"),
    ("MSG_TRACE_STOPPED", "Traceroute dihentikan"),
    ("MSG_TRACE_NOT_RUNNING", "Tidak ada traceroute yang berjalan"),
    ("MSG_WINDOW", "Jendela: {checks} cek"),
    ("MSG_SESSION_RESET", "Statistik sesi diatur ulang"),
    ("MSG_EXPORTED", "Diekspor ke {file}"),
    ("MSG_EXPORT_FAILED", "Ekspor gagal: {error}"),
    ("MSG_LANGUAGE", "Bahasa: Indonesia"),
    ("MSG_THEME", "Tema: {theme}"),
];

fn table(lang: Language) -> &'static [(&'static str, &'static str)] {
    match lang {
        Language::En => EN,
        Language::Id => ID,
    }
}

fn lookup(entries: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Text for `key`, falling back to English and then to the key itself
pub fn tr<'a>(lang: Language, key: &'a str) -> &'a str {
    lookup(table(lang), key)
        .or_else(|| lookup(EN, key))
        .unwrap_or(key)
}

/// Like [`tr`], with `{name}` placeholders replaced from `args`
pub fn tr_fmt(lang: Language, key: &str, args: &[(&str, String)]) -> String {
    args.iter()
        .fold(tr(lang, key).to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gms::state::{Alert, QualityReason, QualityTier};

    #[test]
    fn test_fallback_chain() {
        assert_eq!(tr(Language::Id, "QUALITY_GOOD"), "Baik");
        // Missing from the Indonesian table
        assert_eq!(tr(Language::Id, "METRIC_PING_LABEL"), "Ping");
        assert_eq!(tr(Language::En, "NO_SUCH_KEY"), "NO_SUCH_KEY");
    }

    #[test]
    fn test_placeholders() {
        let text = tr_fmt(
            Language::En,
            "LOSS_VALUE",
            &[("loss", "2.5".into()), ("lost", "1".into()), ("count", "40".into())],
        );
        assert_eq!(text, "2.5% (1/40 lost)");
        assert_eq!(tr_fmt(Language::En, "MSG_WINDOW", &[]), "Window: {checks} checks");
    }

    #[test]
    fn test_core_keys_are_translated() {
        let tiers = [
            QualityTier::Unknown,
            QualityTier::Excellent,
            QualityTier::Good,
            QualityTier::Fair,
            QualityTier::Poor,
        ];
        let reasons = [
            QualityReason::NoSamples,
            QualityReason::WarmingUp,
            QualityReason::NoSuccessfulSamples,
            QualityReason::LowLossLatencyJitter,
            QualityReason::SmallLossModerateLatency,
            QualityReason::NoticeableLossOrLatency,
            QualityReason::HighLossOrLatency,
        ];
        let keys = tiers
            .iter()
            .map(|t| t.key())
            .chain(reasons.iter().map(|r| r.key()))
            .chain([Alert::DelaySpike.key(), Alert::HighLoss.key()]);

        for key in keys {
            assert!(lookup(EN, key).is_some(), "{} missing from en", key);
            assert!(lookup(ID, key).is_some(), "{} missing from id", key);
        }
    }
}
