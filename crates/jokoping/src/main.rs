fn main() {
    jokoping::start_jokoping();
}
