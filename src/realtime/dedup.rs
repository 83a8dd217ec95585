// src/realtime/dedup.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// Estado interno do guard. Cada evento aceito gera uma chave "id:bucket"
// e atualiza o último instante em que o id foi visto.
#[derive(Debug, Default)]
struct DedupState {
    keys: HashSet<String>,
    last_seen: HashMap<String, i64>,
    // Ordem de chegada (chave, id, timestamp) para o envelhecimento
    order: VecDeque<(String, String, i64)>,
    newest: i64,
}

/// Descarta notificações repetidas dentro de uma janela de tempo.
///
/// O bucket de um evento é `floor(timestamp / janela)`. Um evento é descartado
/// quando o par (id, bucket) já foi registrado, ou quando o mesmo id foi
/// registrado há menos de uma janela (cobre eventos que caem em buckets
/// vizinhos). A memória é limitada por `max_entries`.
#[derive(Debug)]
pub struct NotificationDeduper {
    window_ms: i64,
    max_entries: usize,
    state: Mutex<DedupState>,
}

impl NotificationDeduper {
    pub fn new(window: Duration, max_entries: usize) -> Self {
        Self {
            window_ms: (window.as_millis() as i64).max(1),
            max_entries: max_entries.max(1),
            state: Mutex::new(DedupState::default()),
        }
    }

    pub fn bucket(&self, timestamp_ms: i64) -> i64 {
        timestamp_ms.div_euclid(self.window_ms)
    }

    /// Retorna `true` se o evento deve ser entregue (e o registra),
    /// `false` se é duplicado.
    pub fn check_and_record(&self, event_id: &str, timestamp_ms: i64) -> bool {
        let key = format!("{}:{}", event_id, self.bucket(timestamp_ms));

        // Um lock envenenado só significa que outra thread entrou em pânico
        // no meio da contabilidade; o estado continua utilizável.
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());

        if state.keys.contains(&key) {
            return false;
        }
        if let Some(&seen_at) = state.last_seen.get(event_id) {
            if timestamp_ms.abs_diff(seen_at) < self.window_ms as u64 {
                return false;
            }
        }

        state.keys.insert(key.clone());
        state.last_seen.insert(event_id.to_string(), timestamp_ms);
        state.order.push_back((key, event_id.to_string(), timestamp_ms));
        state.newest = state.newest.max(timestamp_ms);

        self.evict(&mut state);
        true
    }

    /// Quantidade de registros na janela.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).order.len()
    }

    fn evict(&self, state: &mut DedupState) {
        let cutoff = state.newest.saturating_sub(self.window_ms);

        // 1. Tudo que já saiu da janela
        while let Some((_, _, ts)) = state.order.front() {
            if *ts > cutoff {
                break;
            }
            Self::pop_oldest(state);
        }

        // 2. Limite de tamanho: os mais antigos saem primeiro
        while state.order.len() > self.max_entries {
            Self::pop_oldest(state);
        }
    }

    fn pop_oldest(state: &mut DedupState) {
        if let Some((key, id, ts)) = state.order.pop_front() {
            state.keys.remove(&key);
            // Só remove o id se esta entrada for a mais recente dele
            if state.last_seen.get(&id) == Some(&ts) {
                state.last_seen.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deduper(window_secs: u64, max: usize) -> NotificationDeduper {
        NotificationDeduper::new(Duration::from_secs(window_secs), max)
    }

    #[test]
    fn drops_same_id_inside_the_window() {
        let d = deduper(10, 100);
        assert!(d.check_and_record("msg-1", 1_000));
        assert!(!d.check_and_record("msg-1", 1_000));
        assert!(!d.check_and_record("msg-1", 9_999));
    }

    #[test]
    fn drops_same_id_across_adjacent_buckets() {
        let d = deduper(10, 100);
        // 9_500 e 10_500 caem em buckets diferentes, mas a 1s de distância
        assert_eq!(d.bucket(9_500), 0);
        assert_eq!(d.bucket(10_500), 1);
        assert!(d.check_and_record("msg-1", 9_500));
        assert!(!d.check_and_record("msg-1", 10_500));
    }

    #[test]
    fn delivers_again_after_the_window() {
        let d = deduper(10, 100);
        assert!(d.check_and_record("msg-1", 0));
        assert!(d.check_and_record("msg-1", 10_000));
        assert!(!d.check_and_record("msg-1", 15_000));
        assert!(d.check_and_record("msg-1", 25_000));
    }

    #[test]
    fn distinct_ids_do_not_interfere() {
        let d = deduper(10, 100);
        assert!(d.check_and_record("a", 1_000));
        assert!(d.check_and_record("b", 1_000));
        assert!(!d.check_and_record("a", 1_001));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn ages_out_entries_older_than_the_window() {
        let d = deduper(10, 100);
        for i in 0..5 {
            assert!(d.check_and_record(&format!("old-{}", i), 1_000));
        }
        assert_eq!(d.len(), 5);
        assert!(d.check_and_record("new", 50_000));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn never_exceeds_max_entries() {
        let d = deduper(3600, 3);
        for i in 0..10 {
            assert!(d.check_and_record(&format!("id-{}", i), 1_000 + i));
            assert!(d.len() <= 3);
        }
        // O mais antigo foi despejado, então volta a ser entregue
        assert!(d.check_and_record("id-0", 1_020));
        // Os recentes continuam bloqueados
        assert!(!d.check_and_record("id-9", 1_021));
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let d = deduper(10, 100);
        assert!(d.check_and_record("x", i64::MIN));
        assert!(d.check_and_record("x", i64::MAX));
        assert!(!d.check_and_record("x", i64::MAX));
        assert!(d.check_and_record("y", i64::MIN + 1));
    }

    #[test]
    fn eviction_keeps_newer_record_of_same_id() {
        let d = deduper(10, 100);
        assert!(d.check_and_record("x", 0));
        assert!(d.check_and_record("x", 10_000));
        // A entrada de t=0 envelheceu; a de t=10_000 ainda bloqueia
        assert!(d.check_and_record("y", 19_000));
        assert!(!d.check_and_record("x", 19_500));
    }
}
