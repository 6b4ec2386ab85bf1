fn main() -> anyhow::Result<()> {
    posturewatch_lib::run()
}
